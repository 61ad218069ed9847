//! Requests the core hands to the native shell.
//!
//! The core never performs I/O against the image cache, timers, navigation or
//! the update checker itself. Each is a capability that turns calls into
//! [`Effect`]s for the shell; a timer firing comes back as an [`Event`].

mod image_cache;
mod navigator;
mod timer;
mod update_check;

pub use self::image_cache::{ImageCache, ImageCacheOperation};
pub use self::navigator::Navigator;
pub use self::timer::{Timer, TimerId, TimerOperation};
pub use self::update_check::{UpdateCheck, UpdateCheckPolicy};

pub use crux_core::render::{Render, RenderOperation};

use crux_core::bridge::ResolveSerialized;
use crux_core::capability::ProtoContext;
use crux_core::{Request, WithContext};
use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::event::Event;
use crate::navigation::NavigationRequest;

pub struct Capabilities {
    pub render: Render<Event>,
    pub image_cache: ImageCache<Event>,
    pub timer: Timer<Event>,
    pub navigator: Navigator<Event>,
    pub update_check: UpdateCheck<Event>,
}

#[derive(Debug)]
pub enum Effect {
    Render(Request<RenderOperation>),
    ImageCache(Request<ImageCacheOperation>),
    Timer(Request<TimerOperation>),
    Navigator(Request<NavigationRequest>),
    UpdateCheck(Request<UpdateCheckPolicy>),
}

/// What crosses the bridge: the operation without its resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Effect")]
pub enum EffectFfi {
    Render(RenderOperation),
    ImageCache(ImageCacheOperation),
    Timer(TimerOperation),
    Navigator(NavigationRequest),
    UpdateCheck(UpdateCheckPolicy),
}

impl crux_core::Effect for Effect {
    type Ffi = EffectFfi;

    fn serialize(self) -> (Self::Ffi, ResolveSerialized) {
        match self {
            Effect::Render(request) => request.serialize(EffectFfi::Render),
            Effect::ImageCache(request) => request.serialize(EffectFfi::ImageCache),
            Effect::Timer(request) => request.serialize(EffectFfi::Timer),
            Effect::Navigator(request) => request.serialize(EffectFfi::Navigator),
            Effect::UpdateCheck(request) => request.serialize(EffectFfi::UpdateCheck),
        }
    }
}

impl WithContext<App, Effect> for Capabilities {
    fn new_with_context(context: ProtoContext<Effect, Event>) -> Capabilities {
        Capabilities {
            render: Render::new(context.specialize(Effect::Render)),
            image_cache: ImageCache::new(context.specialize(Effect::ImageCache)),
            timer: Timer::new(context.specialize(Effect::Timer)),
            navigator: Navigator::new(context.specialize(Effect::Navigator)),
            update_check: UpdateCheck::new(context.specialize(Effect::UpdateCheck)),
        }
    }
}

impl Effect {
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Effect::Render(_))
    }

    #[must_use]
    pub fn into_timer(self) -> Option<Request<TimerOperation>> {
        match self {
            Effect::Timer(request) => Some(request),
            _ => None,
        }
    }

    /// The operation alone, e.g. to compare effects in tests or log them.
    #[must_use]
    pub fn operation(&self) -> EffectFfi {
        match self {
            Effect::Render(request) => EffectFfi::Render(request.operation.clone()),
            Effect::ImageCache(request) => EffectFfi::ImageCache(request.operation.clone()),
            Effect::Timer(request) => EffectFfi::Timer(request.operation.clone()),
            Effect::Navigator(request) => EffectFfi::Navigator(request.operation.clone()),
            Effect::UpdateCheck(request) => EffectFfi::UpdateCheck(request.operation),
        }
    }
}
