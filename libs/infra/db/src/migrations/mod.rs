// [libs/infra/db/src/migrations/mod.rs]
/*!
 * =================================================================
 * APARATO: MIGRATION RUNNER (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER
 * RESPONSABILIDAD: APLICACIÓN IDEMPOTENTE DE ESQUEMA
 *
 * The SQL files themselves are idempotent (every DDL statement is
 * wrapped in `DO $$ BEGIN ... EXCEPTION WHEN others THEN NULL; END $$;`),
 * so re-running an already-applied file is harmless. This runner still
 * records applied versions in `schema_migrations` so startup can skip
 * the round-trip of re-sending SQL it already knows succeeded, and so
 * an operator can see what version a given database is on.
 * =================================================================
 */

use crate::errors::DbError;
use sqlx::PgPool;
use tracing::info;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// Embedded in lexicographic order — the order the runner applies them.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_customers",
        sql: include_str!("sql/001_customers.sql"),
    },
    Migration {
        version: "002_entries",
        sql: include_str!("sql/002_entries.sql"),
    },
    Migration {
        version: "003_gate_passes",
        sql: include_str!("sql/003_gate_passes.sql"),
    },
    Migration {
        version: "004_ledger",
        sql: include_str!("sql/004_ledger.sql"),
    },
    Migration {
        version: "005_media",
        sql: include_str!("sql/005_media.sql"),
    },
    Migration {
        version: "006_audit",
        sql: include_str!("sql/006_audit.sql"),
    },
    Migration {
        version: "007_ops",
        sql: include_str!("sql/007_ops.sql"),
    },
    Migration {
        version: "008_backups",
        sql: include_str!("sql/008_backups.sql"),
    },
];

async fn ensure_migrations_table(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn is_applied(pool: &PgPool, version: &str) -> Result<bool, DbError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT version FROM schema_migrations WHERE version = $1")
        .bind(version)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

async fn record_applied(pool: &PgPool, version: &str) -> Result<(), DbError> {
    sqlx::query("INSERT INTO schema_migrations (version) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Applies every embedded migration in order, skipping versions already
/// recorded. Each file is sent as one multi-statement batch.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    ensure_migrations_table(pool).await?;

    for migration in MIGRATIONS {
        if is_applied(pool, migration.version).await? {
            continue;
        }

        sqlx::raw_sql(migration.sql)
            .execute(pool)
            .await
            .map_err(|e| DbError::MigrationError(format!("{}: {}", migration.version, e)))?;

        record_applied(pool, migration.version).await?;
        info!(version = migration.version, "migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_listed_in_lexicographic_order() {
        let versions: Vec<&str> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
    }
}
