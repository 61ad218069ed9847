use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Instructions for the shell's image cache. Fire-and-forget: failures stay
/// inside the image layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageCacheOperation {
    ClearDisk,
    ClearMemory,
    /// Entries older than this are expired.
    SetMaxAge { secs: u64 },
    CleanExpired,
    /// Abandon in-flight downloads for views that went away.
    CancelLoads { urls: Vec<String> },
}

impl ImageCacheOperation {
    /// Both tiers, disk first.
    #[must_use]
    pub fn clear_all() -> [Self; 2] {
        [Self::ClearDisk, Self::ClearMemory]
    }
}

impl Operation for ImageCacheOperation {
    type Output = ();
}

pub struct ImageCache<E> {
    context: CapabilityContext<ImageCacheOperation, E>,
}

impl<Ev> Capability<Ev> for ImageCache<Ev> {
    type Operation = ImageCacheOperation;
    type MappedSelf<MappedEv> = ImageCache<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        ImageCache::new(self.context.map_event(f))
    }
}

impl<E> ImageCache<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<ImageCacheOperation, E>) -> Self {
        Self { context }
    }

    /// Hands `operation` to the shell; nothing comes back.
    pub fn perform(&self, operation: ImageCacheOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }

    pub fn clear_all(&self) {
        for operation in ImageCacheOperation::clear_all() {
            self.perform(operation);
        }
    }
}
