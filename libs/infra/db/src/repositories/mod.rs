// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY LAYER (ESTRATO L3)
 * CLASIFICACIÓN: INFRASTRUCTURE — TRANSACTIONAL PERSISTENCE
 *
 * One module per aggregate. Every repository method that mutates state
 * opens its own transaction, loads the rows it needs under `FOR UPDATE`
 * (or `FOR UPDATE SKIP LOCKED` for queue claiming), calls into the pure
 * domain crates for the arithmetic/transition decision, and writes the
 * result back before committing. No repository method leaves a
 * transaction open across an `.await` boundary that isn't itself
 * waiting on Postgres.
 * =================================================================
 */

pub mod audit;
pub mod backup;
pub mod customer;
pub mod entry;
pub mod gate_pass;
pub mod ledger;
pub mod media;
pub mod room_entry;
pub mod trash;

pub use audit::AuditRepository;
pub use backup::BackupRepository;
pub use customer::CustomerRepository;
pub use entry::EntryRepository;
pub use gate_pass::GatePassRepository;
pub use ledger::LedgerRepository;
pub use media::MediaRepository;
pub use room_entry::RoomEntryRepository;
pub use trash::TrashRepository;
