// [apps/gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (ESTRATO L3)
 * CLASIFICACIÓN: APPLICATION SHELL
 * RESPONSABILIDAD: LECTURA DE ENTORNO E IGNICIÓN DEL KERNEL
 *
 * Every `DATABASE_ENDPOINTS` entry is `host:port:user:database[:peer]`;
 * the trailing `:peer` marks the local Unix-socket endpoint that also
 * gets a no-password candidate appended by the connection manager.
 * `DATABASE_PASSWORDS` is a comma-separated ordered candidate list
 * tried against every endpoint in turn.
 * =================================================================
 */

use coldstore_gateway::kernel::KernelConfig;
use coldstore_gateway::prelude::*;
use coldstore_gateway::services::backup_scheduler::DEFAULT_DUMP_INTERVAL_SECONDS;
use coldstore_gateway::services::media_sync::DEFAULT_WORKER_COUNT;
use coldstore_infra_db::connection::Endpoint;
use coldstore_infra_storage::S3CompatibleConfig;
use dotenvy::dotenv;
use tracing::info;

fn parse_endpoints(raw: &str) -> Vec<Endpoint> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split(':').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(Endpoint {
                host: parts[0].to_string(),
                port: parts[1].parse().unwrap_or(5432),
                user: parts[2].to_string(),
                database: parts[3].to_string(),
                supports_peer_auth: parts.get(4) == Some(&"peer"),
            })
        })
        .collect()
}

fn nas_config_from_env() -> Option<S3CompatibleConfig> {
    let endpoint = std::env::var("NAS_S3_ENDPOINT").ok()?;
    Some(S3CompatibleConfig {
        endpoint,
        region: std::env::var("NAS_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        access_key_id: std::env::var("NAS_S3_ACCESS_KEY_ID").unwrap_or_default(),
        secret_access_key: std::env::var("NAS_S3_SECRET_ACCESS_KEY").unwrap_or_default(),
        bucket: std::env::var("NAS_S3_BUCKET").unwrap_or_else(|_| "coldstore-media".to_string()),
        backend_name: "nas",
    })
}

fn cloud_config_from_env() -> S3CompatibleConfig {
    S3CompatibleConfig {
        endpoint: std::env::var("CLOUD_S3_ENDPOINT").unwrap_or_default(),
        region: std::env::var("CLOUD_S3_REGION").unwrap_or_else(|_| "auto".to_string()),
        access_key_id: std::env::var("CLOUD_S3_ACCESS_KEY_ID").unwrap_or_default(),
        secret_access_key: std::env::var("CLOUD_S3_SECRET_ACCESS_KEY").unwrap_or_default(),
        bucket: std::env::var("CLOUD_S3_BUCKET").unwrap_or_else(|_| "coldstore-media".to_string()),
        backend_name: "r2",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    coldstore_shared_heimdall::init_tracing("coldstore_gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().thread_stack_size(4 * 1024 * 1024).build()?;

    runtime.block_on(async {
        let endpoints = parse_endpoints(&std::env::var("DATABASE_ENDPOINTS").unwrap_or_default());
        let password_candidates: Vec<String> =
            std::env::var("DATABASE_PASSWORDS").unwrap_or_default().split(',').filter(|s| !s.is_empty()).map(ToString::to_string).collect();

        let config = KernelConfig {
            endpoints,
            password_candidates,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            max_consecutive_failures: std::env::var("DATABASE_MAX_CONSECUTIVE_FAILURES").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            local_media_root: std::env::var("LOCAL_MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string()),
            nas_config: nas_config_from_env(),
            cloud_config: cloud_config_from_env(),
            listening_port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            media_sync_workers: std::env::var("MEDIA_SYNC_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_WORKER_COUNT),
            backup_dump_interval_secs: std::env::var("BACKUP_DUMP_INTERVAL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DUMP_INTERVAL_SECONDS),
        };

        let port = config.listening_port;
        let kernel = GatewayKernel::ignite(config).await;

        info!(port, "coldstore gateway ignited");
        kernel.launch().await;

        Ok(())
    })
}
