// [apps/gateway/src/services/reconnect_monitor.rs]
/*!
 * APARATO: CONNECTION LIVENESS MONITOR (ESTRATO L3)
 * Pings the active pool every tick. `sqlx`'s own pool already retries
 * individual connections; what this daemon watches for is the pool
 * going dark entirely, in which case it flips `SystemMode` into
 * `SetupRequired` so the perimeter stops accepting writes and routes
 * operators toward the restore path instead of serving requests
 * against a warehouse nobody can reach. Recovery is symmetric: the
 * first successful ping after an outage clears the mode again.
 */

use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::state::{AppState, SystemMode};

const PING_INTERVAL: Duration = Duration::from_secs(15);

pub fn spawn_reconnect_monitor(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = interval(PING_INTERVAL);
        loop {
            ticker.tick().await;

            match state.db.ping().await {
                Ok(()) => {
                    let was_down = matches!(&*state.system_mode.read().expect("system mode lock poisoned"), SystemMode::SetupRequired(_));
                    if was_down {
                        info!("database connection recovered, leaving setup mode");
                        state.set_system_mode(SystemMode::Operational);
                    }
                }
                Err(e) => {
                    error!(error = %e, "database ping failed, entering setup mode");
                    state.set_system_mode(SystemMode::SetupRequired(format!("database unreachable: {e}")));
                }
            }
        }
    });
}
