use crux_core::capability::{Capability, CapabilityContext, Operation};

use crate::navigation::NavigationRequest;

impl Operation for NavigationRequest {
    type Output = ();
}

/// Tells the shell which screen to present; the core keeps its own stack.
pub struct Navigator<E> {
    context: CapabilityContext<NavigationRequest, E>,
}

impl<Ev> Capability<Ev> for Navigator<Ev> {
    type Operation = NavigationRequest;
    type MappedSelf<MappedEv> = Navigator<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Navigator::new(self.context.map_event(f))
    }
}

impl<E> Navigator<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<NavigationRequest, E>) -> Self {
        Self { context }
    }

    pub fn navigate(&self, request: NavigationRequest) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(request).await;
        });
    }
}
