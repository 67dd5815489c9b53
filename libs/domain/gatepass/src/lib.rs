// [libs/domain/gatepass/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATE-PASS RESERVATION ENGINE (ESTRATO L2)
 * CLASIFICACIÓN: CRATE ROOT — PURE DOMAIN LOGIC
 * RESPONSABILIDAD: ARITMÉTICA DE INVENTARIO Y MÁQUINA DE ESTADOS
 *
 * No SQL, no I/O, no clock of its own — every function takes `now` and
 * the sibling rows as arguments. This is deliberate: the design's regression
 * scenarios (the 52-bag double-booking bug, zombie pending expiry,
 * partial-pickup completion) must be reproducible as plain unit tests
 * without standing up a database.
 * =================================================================
 */

pub mod engine;
pub mod policy;
pub mod workflow;

pub use engine::{
    available, committed_total, expire, physical, picked_up_total, record_pickup, should_expire, validate_approve, validate_create,
    validate_gatar_breakdown, PickupOutcome,
};
pub use policy::GatePassPolicy;
pub use workflow::{apply_pickup, approve_gate_pass, create_gate_pass, reject_gate_pass, sweep_expired};
