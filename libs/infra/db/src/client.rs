// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE POOL CLIENT (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER
 * RESPONSABILIDAD: GESTIÓN DEL POOL DE CONEXIONES ACID
 * =================================================================
 */

use crate::errors::DbError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        if database_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL is empty".into()));
        }

        info!("connecting to database");
        let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Builds a pool without validating connectivity up front. Used by
    /// the kernel when every configured endpoint was unreachable at
    /// startup: the gateway still needs a `PgPool` to hand repositories
    /// and the reconnect monitor, and a lazy pool will happily sit idle
    /// (erroring per-query) until an endpoint comes back, rather than
    /// blocking ignition on a connection that doesn't exist yet.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        if database_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL is empty".into()));
        }

        let pool = PgPoolOptions::new().max_connections(max_connections).connect_lazy(database_url).map_err(|e| DbError::ConnectionError(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Used by the connection manager's probe loop: a bare `SELECT 1`
    /// against an already-open pool, no schema assumptions.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
