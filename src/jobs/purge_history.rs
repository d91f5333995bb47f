use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::PeriodicJob;
use crate::conversation::ConversationService;

/// Deletes expired history and forgets idle rate limit entries so
/// neither grows without bound between reads.
#[derive(Debug)]
pub struct PurgeExpiredHistory {
    pub interval: Duration,
}

impl Default for PurgeExpiredHistory {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 5),
        }
    }
}

#[async_trait]
impl PeriodicJob for PurgeExpiredHistory {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_job(&self, service: &ConversationService) {
        match service.store().purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!("Purged {} expired message(s)", purged),
            Err(e) => tracing::error!("Failed to purge expired messages: {}", e),
        }

        let pruned = service.limiter().prune(Instant::now());
        if pruned > 0 {
            tracing::debug!("Pruned {} idle rate limit entries", pruned);
        }
    }
}
