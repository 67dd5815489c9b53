// [apps/gateway/src/services/gate_pass_sweeper.rs]
/*!
 * Expires gate passes past their pending/approval window every minute.
 * `sweep_expired` is one atomic `UPDATE`, so overlapping ticks (a slow
 * cycle that runs past the next tick) are harmless: whichever one runs
 * just expires whatever is currently overdue.
 */

use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info};

use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub fn spawn_gate_pass_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match state.gate_passes.sweep_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(count) => info!(count, "expired overdue gate passes"),
                Err(e) => error!(error = %e, "gate pass sweep failed"),
            }
        }
    });
}
