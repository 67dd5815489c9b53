// [libs/domain/ledger/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOUBLE-ENTRY LEDGER ENGINE (ESTRATO L2)
 * CLASIFICACIÓN: CRATE ROOT — PURE DOMAIN LOGIC
 *
 * Running-balance projection and reconciliation, kept free of SQL so
 * the core arithmetic invariant (`balance = prev + debit - credit`)
 * is checkable against a plain slice of rows. The three
 * automatic-insertion triggers named in the design (entry storage-fee
 * charge, rent-payment receipt, debt-approval audit row) are
 * repository-layer concerns — they call `project_balance` once per
 * insert inside the customer-row `FOR UPDATE` transaction.
 * =================================================================
 */

pub mod engine;

pub use engine::{project_all, project_balance, reconcile, ReconciliationMismatch};
