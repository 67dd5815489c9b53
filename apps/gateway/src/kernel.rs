// [apps/gateway/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY KERNEL (ESTRATO L1-APP)
 * CLASIFICACIÓN: COMPOSITION ROOT
 * RESPONSABILIDAD: IGNICIÓN DE INFRAESTRUCTURA Y SERVIDOR HTTP
 *
 * `ignite` probes every configured database endpoint in order and
 * wires the three storage backends before building `AppState`.
 * `launch` spawns the five background daemons and then blocks serving
 * HTTP traffic — the daemons and the listener share the same runtime,
 * so a panic in a daemon doesn't silently stop the whole process (it
 * surfaces as a dropped task, logged by the Tokio default panic hook).
 * =================================================================
 */

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use coldstore_infra_db::connection::{ConnectionManager, Endpoint};
use coldstore_infra_db::migrations::run_migrations;
use coldstore_infra_storage::{LocalFsBackend, S3CompatibleBackend, S3CompatibleConfig, StorageBackends};
use tracing::{error, info};

use crate::bootstrap::spawn_diagnostics;
use crate::routes::create_router;
use crate::services::{
    spawn_backup_scheduler, spawn_gate_pass_sweeper, spawn_media_sync_workers, spawn_reconnect_monitor, spawn_trash_purger,
};
use crate::state::{AppState, SystemMode};

/// Where the local backend roots its tree and what to connect to for
/// the two S3-compatible legs. Read from the environment by `main`.
pub struct KernelConfig {
    pub endpoints: Vec<Endpoint>,
    pub password_candidates: Vec<String>,
    pub max_connections: u32,
    pub max_consecutive_failures: u32,
    pub local_media_root: String,
    pub nas_config: Option<S3CompatibleConfig>,
    pub cloud_config: S3CompatibleConfig,
    pub listening_port: u16,
    pub media_sync_workers: usize,
    pub backup_dump_interval_secs: u64,
}

pub struct GatewayKernel {
    port: u16,
    state: AppState,
    media_sync_workers: usize,
    backup_dump_interval_secs: u64,
}

impl GatewayKernel {
    pub async fn ignite(config: KernelConfig) -> Self {
        let mut manager = ConnectionManager::new(
            config.endpoints,
            config.password_candidates,
            config.max_connections,
            config.max_consecutive_failures,
        );

        let connect_failed;
        let (client, backup_prefix_tag) = match manager.connect().await {
            Ok(connected) => {
                connect_failed = false;
                (connected.client, connected.endpoint.backup_prefix_tag())
            }
            Err(e) => {
                error!(error = %e, "no database endpoint reachable, entering setup mode");
                connect_failed = true;
                let first_endpoint = config.endpoints.first();
                let fallback_url = first_endpoint
                    .map(|ep| format!("postgres://{}:{}/{}", ep.host, ep.port, ep.database))
                    .unwrap_or_else(|| "postgres://127.0.0.1:5432/coldstore".to_string());
                let client = coldstore_infra_db::DbClient::connect_lazy(&fallback_url, config.max_connections)
                    .expect("FATAL: unable to construct even a lazy placeholder database pool");
                let tag = first_endpoint.map(|ep| ep.backup_prefix_tag()).unwrap_or_else(|| "unknown".to_string());
                (client, tag)
            }
        };

        let local = Arc::new(LocalFsBackend::new(config.local_media_root));
        let nas = match config.nas_config {
            Some(nas_cfg) => Some(Arc::new(S3CompatibleBackend::connect(nas_cfg).await) as Arc<dyn coldstore_infra_storage::StorageBackend>),
            None => None,
        };
        let cloud = Arc::new(S3CompatibleBackend::connect(config.cloud_config).await);
        let storage = StorageBackends { local, nas, cloud };

        if !connect_failed {
            if let Err(e) = run_migrations(client.pool()).await {
                error!(error = %e, "schema migration failed at ignition");
            }
        }

        let state = AppState::new(client, storage, backup_prefix_tag);
        if connect_failed {
            state.set_system_mode(SystemMode::SetupRequired("no configured database endpoint was reachable at startup".to_string()));
        }

        Self {
            port: config.listening_port,
            state,
            media_sync_workers: config.media_sync_workers,
            backup_dump_interval_secs: config.backup_dump_interval_secs,
        }
    }

    pub async fn launch(self) {
        let state = self.state;

        spawn_diagnostics(state.clone());
        spawn_gate_pass_sweeper(state.clone());
        spawn_trash_purger(state.clone());
        spawn_media_sync_workers(state.clone(), self.media_sync_workers);
        spawn_backup_scheduler(state.clone(), self.backup_dump_interval_secs);
        spawn_reconnect_monitor(state.clone());

        let router = create_router(state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().expect("loopback literal is valid"), self.port);

        info!(%bind_address, "gateway listening");
        let listener = tokio::net::TcpListener::bind(bind_address).await.expect("failed to bind network port");

        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "gateway server terminated");
            std::process::exit(1);
        }
    }
}
