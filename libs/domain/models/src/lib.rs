// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODEL LIBRARY ROOT (ESTRATO L2)
 * CLASIFICACIÓN: CRATE ROOT
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE ENTIDADES
 *
 * Single source of truth for every entity named in the data model:
 * Customer, FamilyMember, Entry, RoomEntry, Gatar, GatePass, Pickup,
 * LedgerEntry, DebtRequest, RentPayment, MediaSyncRecord, EntryEvent,
 * plus the ambient identity, error, and operation-mode contracts.
 * =================================================================
 */

pub mod audit;
pub mod customer;
pub mod entry;
pub mod errors;
pub mod gate_pass;
pub mod identity;
pub mod ledger;
pub mod media;
pub mod mode;
pub mod room_entry;

pub use audit::{EditLogEntry, EntryEvent, EntryEventKind, TableChangeWatermark, TokenColor, TrashRecord};
pub use customer::{Customer, FamilyMember};
pub use entry::{Entry, EntryCategory};
pub use errors::CoreError;
pub use gate_pass::{GatePass, GatePassStatus, Pickup, PickupGatar};
pub use identity::{AuthContext, Permissions, Role};
pub use ledger::{DebtRequest, DebtRequestStatus, LedgerEntry, LedgerEntryKind, RentPayment};
pub use media::{MediaSourceKind, MediaSyncRecord, SyncStatus};
pub use mode::OperationMode;
pub use room_entry::{Gatar, RoomEntry};
