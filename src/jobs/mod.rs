//! Background jobs that run on a fixed interval for the lifetime of
//! the server.

mod purge_history;

pub use purge_history::PurgeExpiredHistory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::conversation::ConversationService;

#[async_trait]
pub trait PeriodicJob: Send + Sync + std::fmt::Debug + 'static {
    fn interval(&self) -> Duration;

    async fn run_job(&self, service: &ConversationService);
}

/// Spawn `job` in its own tokio task. The first run happens one
/// interval after startup.
pub fn spawn_periodic_job<J: PeriodicJob>(
    service: Arc<ConversationService>,
    job: J,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // tokio panics on a zero period
        let mut interval = tokio::time::interval(job.interval().max(Duration::from_secs(1)));
        // Skip the immediate first tick
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic job {:?}", job);
            job.run_job(&service).await;
        }
    })
}
