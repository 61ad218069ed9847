//! Manual and timed refresh of what is on screen.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capabilities::{ImageCacheOperation, TimerId, TimerOperation};
use crate::model::UnixTimeMs;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTrigger {
    /// Refresh button.
    Manual,
    PullToRefresh,
    Timer,
    /// A screen appeared with data older than the refresh interval.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshDecision {
    Started { cache: Vec<ImageCacheOperation> },
    /// Already refreshing; the request is dropped, not queued.
    Dropped,
}

/// Idle/Refreshing state machine. It owns no catalog data: it tells the image
/// cache to forget what it has and keeps track of when that last happened.
#[derive(Debug, Default)]
pub struct RefreshController {
    state: RefreshState,
    last_update: Option<UnixTimeMs>,
    trigger: Option<RefreshTrigger>,
}

impl RefreshController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> RefreshState {
        self.state
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state == RefreshState::Refreshing
    }

    #[must_use]
    pub fn last_update(&self) -> Option<UnixTimeMs> {
        self.last_update
    }

    #[must_use]
    pub fn trigger(&self) -> Option<RefreshTrigger> {
        self.trigger
    }

    /// Idle -> Refreshing. Cache tiers are only invalidated when the network
    /// is reachable; offline, cached images are all there is to show.
    pub fn begin(&mut self, trigger: RefreshTrigger, reachable: bool) -> RefreshDecision {
        if self.is_refreshing() {
            debug!(?trigger, "refresh already running, dropping request");
            return RefreshDecision::Dropped;
        }

        self.state = RefreshState::Refreshing;
        self.trigger = Some(trigger);

        let cache = if reachable {
            ImageCacheOperation::clear_all().to_vec()
        } else {
            info!(?trigger, "offline, keeping cached images");
            Vec::new()
        };

        RefreshDecision::Started { cache }
    }

    /// Refreshing -> Idle, stamping `last_update` with `now`.
    pub fn finish(&mut self, now: UnixTimeMs) -> UnixTimeMs {
        if !self.is_refreshing() {
            warn!("finish called while idle");
        }
        self.state = RefreshState::Idle;
        self.trigger = None;
        self.last_update = Some(now);
        now
    }

    /// True when nothing was refreshed yet or the last refresh is older than
    /// `max_age`.
    #[must_use]
    pub fn needs_refresh(&self, now: UnixTimeMs, max_age: Duration) -> bool {
        self.last_update
            .map_or(true, |at| now.elapsed_since(at) >= max_age)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Armed {
    id: TimerId,
    period_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerFire {
    /// Not the armed timer (cancelled or re-armed since); ignore.
    Stale,
    /// The armed timer fired; schedule the next cycle with `reschedule`.
    Due { reschedule: TimerOperation },
}

/// Autorefresh timer driven by the settings. Every (re)arm gets a fresh id so
/// a firing from a cancelled timer can be told apart.
#[derive(Debug, Default)]
pub struct AutorefreshTimer {
    armed: Option<Armed>,
}

impl AutorefreshTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    #[must_use]
    pub fn armed_id(&self) -> Option<&TimerId> {
        self.armed.as_ref().map(|a| &a.id)
    }

    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        self.armed.as_ref().map(|a| Duration::from_secs(a.period_secs))
    }

    /// Brings the timer in line with `settings`. A new period takes effect on
    /// the next cycle; nothing fires immediately.
    pub fn apply(&mut self, settings: &Settings) -> Vec<TimerOperation> {
        let period_secs = u64::from(settings.autorefresh_interval_secs());
        let mut ops = Vec::new();

        match (&self.armed, settings.should_autorefresh()) {
            (None, false) => {}
            (Some(armed), true) if armed.period_secs == period_secs => {}
            (current, enabled) => {
                if let Some(old) = current {
                    ops.push(TimerOperation::Cancel { id: old.id.clone() });
                }
                self.armed = None;

                if enabled {
                    let id = TimerId::generate();
                    info!(timer_id = %id, period_secs, "autorefresh armed");
                    ops.push(TimerOperation::Schedule {
                        id: id.clone(),
                        after_secs: period_secs,
                    });
                    self.armed = Some(Armed { id, period_secs });
                } else {
                    info!("autorefresh disarmed");
                }
            }
        }

        ops
    }

    pub fn fired(&mut self, id: &TimerId) -> TimerFire {
        match &self.armed {
            Some(armed) if armed.id == *id => TimerFire::Due {
                reschedule: TimerOperation::Schedule {
                    id: armed.id.clone(),
                    after_secs: armed.period_secs,
                },
            },
            _ => {
                debug!(timer_id = %id, "ignoring stale timer");
                TimerFire::Stale
            }
        }
    }
}
