// [apps/gateway/src/bootstrap.rs]
/*!
 * =================================================================
 * APARATO: ASYNC STARTUP DIAGNOSTICS (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER
 * RESPONSABILIDAD: VERIFICACIÓN DE ALCANZABILIDAD DE BACKENDS
 *
 * Runs off the critical path of ignition: the server can start
 * accepting health checks immediately while this confirms every
 * storage leg is actually reachable, rather than discovering a
 * misconfigured NAS endpoint on the first upload a customer triggers.
 * =================================================================
 */

use tracing::{info, warn};

use crate::state::AppState;

pub fn spawn_diagnostics(state: AppState) {
    tokio::spawn(async move {
        info!("running startup diagnostics");

        match state.storage.local.list("").await {
            Ok(_) => info!(backend = "local", "storage backend reachable"),
            Err(e) => warn!(backend = "local", error = %e, "storage backend unreachable at startup"),
        }

        if let Some(nas) = &state.storage.nas {
            match nas.list("").await {
                Ok(_) => info!(backend = "nas", "storage backend reachable"),
                Err(e) => warn!(backend = "nas", error = %e, "storage backend unreachable at startup"),
            }
        }

        match state.storage.cloud.list("").await {
            Ok(_) => info!(backend = "cloud", "storage backend reachable"),
            Err(e) => warn!(backend = "cloud", error = %e, "storage backend unreachable at startup"),
        }

        match state.db.ping().await {
            Ok(()) => info!("database ping succeeded, clearing any pending setup mode"),
            Err(e) => warn!(error = %e, "database ping failed during startup diagnostics"),
        }
    });
}
