// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use coldstore_domain_models::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    ConnectionError(String),

    #[error("database configuration invalid: {0}")]
    ConfigurationError(String),

    #[error("sql query rejected: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    MigrationError(String),

    #[error("row mapping violation: {0}")]
    MappingError(String),

    #[error("no configured endpoint is reachable")]
    SetupRequired,
}

/// Infra errors cross the façade boundary translated into the core
/// taxonomy (the design: "no silent swallow" — every error keeps a stable
/// kind, it never stays a raw `sqlx::Error` past this layer).
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SetupRequired => CoreError::SetupRequired,
            DbError::QueryError(sqlx::Error::RowNotFound) => CoreError::not_found("row", "unknown"),
            other => CoreError::TransientBackendError {
                backend: "postgres".to_string(),
                message: other.to_string(),
            },
        }
    }
}
