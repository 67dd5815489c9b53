// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: POSTGRES PERSISTENCE ADAPTER (ESTRATO L3)
 * CLASIFICACIÓN: CRATE ROOT
 * RESPONSABILIDAD: POOL, MIGRACIONES, CONEXIÓN MULTI-ENDPOINT, REPOSITORIOS
 *
 * Every multi-row invariant (inventory arithmetic, ledger balance,
 * pickup-gatar consistency, queue claiming) is enforced here with
 * row-level locking inside a transaction — `SELECT ... FOR UPDATE` for
 * single-owner rows, `FOR UPDATE SKIP LOCKED` for the media queue. The
 * pure arithmetic itself lives in `coldstore-domain-gatepass` and
 * `coldstore-domain-ledger`; this crate only owns the SQL that loads
 * rows under lock, calls into that pure layer, and writes the result
 * back inside the same transaction.
 * =================================================================
 */

pub mod client;
pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;

pub use client::DbClient;
pub use connection::{Connected, ConnectionManager, Endpoint};
pub use errors::DbError;
