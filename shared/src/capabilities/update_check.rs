use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// When the shell's update checker should nag. What it finds is its own
/// business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCheckPolicy {
    Immediately,
    Daily,
}

impl Operation for UpdateCheckPolicy {
    type Output = ();
}

pub struct UpdateCheck<E> {
    context: CapabilityContext<UpdateCheckPolicy, E>,
}

impl<Ev> Capability<Ev> for UpdateCheck<Ev> {
    type Operation = UpdateCheckPolicy;
    type MappedSelf<MappedEv> = UpdateCheck<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        UpdateCheck::new(self.context.map_event(f))
    }
}

impl<E> UpdateCheck<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<UpdateCheckPolicy, E>) -> Self {
        Self { context }
    }

    pub fn check(&self, policy: UpdateCheckPolicy) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(policy).await;
        });
    }
}
