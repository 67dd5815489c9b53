// [apps/gateway/src/bin/migrator.rs]
/*!
 * APARATO: DB MIGRATOR CLI (ESTRATO L6)
 * Standalone binary for applying schema migrations ahead of a deploy,
 * independent of gateway ignition — useful when the schema needs to
 * land before the first gateway instance connects (a fresh environment,
 * or a CI step that wants a hard failure on migration error rather
 * than the gateway's soft degrade-to-setup-mode behavior).
 */

use coldstore_infra_db::migrations::run_migrations;
use coldstore_infra_db::DbClient;
use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    coldstore_shared_heimdall::init_tracing("coldstore_migrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().thread_stack_size(4 * 1024 * 1024).build()?;

    runtime.block_on(async {
        info!("applying schema migrations");

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let client = match DbClient::connect(&database_url, 5).await {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "failed to connect to database");
                std::process::exit(1);
            }
        };

        match run_migrations(client.pool()).await {
            Ok(()) => {
                info!("migrations applied successfully");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "migration failed");
                std::process::exit(1);
            }
        }
    })
}
