//! Hand-off point for best-effort background work.

use futures::future::BoxFuture;
use log::debug;

/// A sink for fire-and-forget tasks such as backfill top-ups.
///
/// Callers that have no sink await the task inline instead; nothing relies on
/// a task having run.
pub trait BackgroundTasks: Send + Sync {
    fn spawn(&self, name: &'static str, task: BoxFuture<'static, ()>);
}

/// Spawns onto the current tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioBackgroundTasks;

impl BackgroundTasks for TokioBackgroundTasks {
    fn spawn(&self, name: &'static str, task: BoxFuture<'static, ()>) {
        debug!("Spawning background task {}", name);
        tokio::spawn(task);
    }
}
