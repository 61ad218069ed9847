use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub String);

impl TimerId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One-shot timers run by the shell. A `Schedule` request is resolved when
/// the timer fires; `Cancel` is never resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerOperation {
    Schedule { id: TimerId, after_secs: u64 },
    Cancel { id: TimerId },
}

impl TimerOperation {
    #[must_use]
    pub fn id(&self) -> &TimerId {
        match self {
            Self::Schedule { id, .. } | Self::Cancel { id } => id,
        }
    }
}

impl Operation for TimerOperation {
    type Output = ();
}

pub struct Timer<E> {
    context: CapabilityContext<TimerOperation, E>,
}

impl<Ev> Capability<Ev> for Timer<Ev> {
    type Operation = TimerOperation;
    type MappedSelf<MappedEv> = Timer<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Timer::new(self.context.map_event(f))
    }
}

impl<E> Timer<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, E>) -> Self {
        Self { context }
    }

    /// Asks the shell to fire once after `after_secs`; the firing comes back
    /// as the event built by `on_fire`.
    pub fn schedule<F>(&self, id: TimerId, after_secs: u64, on_fire: F)
    where
        F: FnOnce(TimerId) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let operation = TimerOperation::Schedule {
                id: id.clone(),
                after_secs,
            };
            ctx.request_from_shell(operation).await;
            ctx.update_app(on_fire(id));
        });
    }

    pub fn cancel(&self, id: TimerId) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(TimerOperation::Cancel { id }).await;
        });
    }
}
