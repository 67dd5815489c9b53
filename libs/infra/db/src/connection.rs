// [libs/infra/db/src/connection.rs]
/*!
 * =================================================================
 * APARATO: MULTI-ENDPOINT CONNECTION MANAGER (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER
 * RESPONSABILIDAD: PROBE DE ENLACES Y RESOLUCIÓN DE "SETUP MODE"
 *
 * Walks an ordered list of endpoints, trying every password candidate
 * against each (plus a no-password peer-auth variant for the local
 * Unix-socket endpoint), and wins on the first successful `SELECT 1`
 *. The winning endpoint's host resolves the backup-prefix
 * tag later consumed by the backup scheduler. Total failure returns
 * `DbError::SetupRequired` rather than panicking — the façade routes
 * the process into the restore-driven recovery path instead of normal
 * operation.
 * =================================================================
 */

use crate::client::DbClient;
use crate::errors::DbError;
use tracing::{info, warn};

/// One candidate connection target. `host` doubles as the key used to
/// resolve the backup-prefix tag (the design: "mac-mini-ha", "poc",
/// "production-beta", "local").
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
    /// `true` for the local Unix-socket endpoint, which also gets a
    /// no-password peer-auth attempt appended to its candidate list.
    pub supports_peer_auth: bool,
}

impl Endpoint {
    fn connection_string(&self, password: Option<&str>) -> String {
        match password {
            Some(p) => format!("postgres://{}:{}@{}:{}/{}", self.user, p, self.host, self.port, self.database),
            None => format!("postgres://{}@{}:{}/{}", self.user, self.host, self.port, self.database),
        }
    }

    /// Maps `host` onto the operator-facing backup-prefix tag. Unknown
    /// hosts fall back to the host string itself rather than failing —
    /// the tag only affects where cloud backups land, never correctness.
    pub fn backup_prefix_tag(&self) -> String {
        match self.host.as_str() {
            "mac-mini-ha.local" | "mac-mini-ha" => "mac-mini-ha".to_string(),
            "poc.internal" | "poc" => "poc".to_string(),
            "production-beta.internal" => "production-beta".to_string(),
            "localhost" | "127.0.0.1" | "/var/run/postgresql" => "local".to_string(),
            other => other.to_string(),
        }
    }
}

pub struct ConnectionManager {
    endpoints: Vec<Endpoint>,
    password_candidates: Vec<String>,
    max_connections: u32,
    consecutive_failures: u32,
    max_consecutive_failures: u32,
}

pub struct Connected {
    pub client: DbClient,
    pub endpoint: Endpoint,
}

impl ConnectionManager {
    pub fn new(endpoints: Vec<Endpoint>, password_candidates: Vec<String>, max_connections: u32, max_consecutive_failures: u32) -> Self {
        Self {
            endpoints,
            password_candidates,
            max_connections,
            consecutive_failures: 0,
            max_consecutive_failures,
        }
    }

    /// Walks the endpoint list in order, trying each password candidate
    /// (plus peer auth where supported), and returns the first
    /// successful connection. Returns `SetupRequired` if every endpoint
    /// and every candidate is exhausted.
    pub async fn connect(&mut self) -> Result<Connected, DbError> {
        for endpoint in &self.endpoints {
            let mut candidates: Vec<Option<String>> = self.password_candidates.iter().cloned().map(Some).collect();
            if endpoint.supports_peer_auth {
                candidates.push(None);
            }

            for password in candidates {
                let url = endpoint.connection_string(password.as_deref());
                match DbClient::connect(&url, self.max_connections).await {
                    Ok(client) => {
                        if client.ping().await.is_ok() {
                            info!(host = %endpoint.host, "database endpoint accepted connection");
                            self.consecutive_failures = 0;
                            return Ok(Connected { client, endpoint: endpoint.clone() });
                        }
                    }
                    Err(e) => {
                        warn!(host = %endpoint.host, error = %e, "endpoint candidate rejected");
                    }
                }
            }
        }

        self.consecutive_failures += 1;
        warn!(failures = self.consecutive_failures, "all database endpoints exhausted");
        Err(DbError::SetupRequired)
    }

    /// Re-probes after a runtime connection loss. Bounded by
    /// `max_consecutive_failures`: beyond that, the caller should treat
    /// the outage as fatal rather than retrying forever.
    pub async fn reconnect(&mut self) -> Result<Connected, DbError> {
        if self.consecutive_failures >= self.max_consecutive_failures {
            return Err(DbError::SetupRequired);
        }
        self.connect().await
    }
}
