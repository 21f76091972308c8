use anyhow::Result;

use crate::daemon::monitor::session::SessionEvent;

/// Represents an event processor. This should realistically be able to abstract over different
/// sinks: the local store, a remote sync target.
pub trait EventProcessor {
    fn process_next(&mut self, event: SessionEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
