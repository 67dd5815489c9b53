// [apps/gateway/src/services/trash_purger.rs]
/*!
 * Permanently removes trash rows past their 30-day retention window,
 * once an hour. Never touches rows that have already been restored.
 */

use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub fn spawn_trash_purger(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match state.trash.purge_expired().await {
                Ok(0) => {}
                Ok(count) => info!(count, "purged expired trash rows"),
                Err(e) => error!(error = %e, "trash purge failed"),
            }
        }
    });
}
