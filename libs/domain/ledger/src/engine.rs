// [libs/domain/ledger/src/engine.rs]
/*!
 * =================================================================
 * APARATO: RUNNING-BALANCE PROJECTION & RECONCILIATION (ESTRATO L2)
 * CLASIFICACIÓN: PURE DOMAIN LOGIC — NO PERSISTENCE
 *
 * The ledger is append-only: corrections are new rows, never
 * mutations of old ones. This module owns the one arithmetic invariant
 * that makes that safe to trust — `running_balance` is a pure fold over
 * `(debit, credit)` pairs in creation order, so any stored row can be
 * re-derived and checked without touching the database beyond a read.
 * =================================================================
 */

use coldstore_domain_models::LedgerEntry;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single row whose stored `running_balance` disagrees with the
/// balance re-derived from the ordered debit/credit sequence.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("ledger entry {entry_id} stored balance {stored} does not match projected balance {projected}")]
pub struct ReconciliationMismatch {
    pub entry_id: Uuid,
    pub stored: Decimal,
    pub projected: Decimal,
}

/// Projects the running balance after appending `(debit, credit)` to
/// `previous_balance`. This: `new_balance = prev + debit - credit`.
pub fn project_balance(previous_balance: Decimal, debit: Decimal, credit: Decimal) -> Decimal {
    previous_balance + debit - credit
}

/// Re-derives the running balance for every entry in `entries` (which
/// must already be ordered by `created_at` ascending for the customer
/// it belongs to) starting from `opening_balance`, returning the
/// projected balance after the last entry.
pub fn project_all(opening_balance: Decimal, entries: &[LedgerEntry]) -> Decimal {
    entries
    .iter()
    .fold(opening_balance, |balance, entry| project_balance(balance, entry.debit, entry.credit))
}

/// Walks `entries` in order, recomputing the running balance from
/// `opening_balance`, and reports every row whose stored
/// `running_balance` disagrees with the re-derived value. An empty
/// result means the ledger is internally consistent.
pub fn reconcile(opening_balance: Decimal, entries: &[LedgerEntry]) -> Vec<ReconciliationMismatch> {
    let mut balance = opening_balance;
    let mut mismatches = Vec::new();

    for entry in entries {
        balance = project_balance(balance, entry.debit, entry.credit);
        if balance != entry.running_balance {
            mismatches.push(ReconciliationMismatch {
                    entry_id: entry.id,
                    stored: entry.running_balance,
                    projected: balance,
            });
            // Reconciliation trusts the ledger's own arithmetic going
            // forward rather than compounding the discrepancy across
            // every later row: resynchronise to the stored value so a
            // single bad insert doesn't cascade into a false mismatch
            // report for every entry that follows it.
            balance = entry.running_balance;
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coldstore_domain_models::LedgerEntryKind;

    fn entry(debit: i64, credit: i64, running_balance: i64) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            kind: LedgerEntryKind::Charge,
            debit: Decimal::from(debit),
            credit: Decimal::from(credit),
            description: "test".to_string(),
            running_balance: Decimal::from(running_balance),
            source_kind: "entry".to_string(),
            source_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn projects_running_balance() {
        assert_eq!(project_balance(Decimal::from(1000), Decimal::from(500), Decimal::from(200)), Decimal::from(1300));
    }

    #[test]
    fn clean_ledger_reconciles_with_no_mismatches() {
        let entries = vec![entry(500, 0, 500), entry(0, 200, 300), entry(1000, 0, 1300)];
        assert!(reconcile(Decimal::ZERO, &entries).is_empty());
    }

    #[test]
    fn single_bad_row_is_reported_without_cascading() {
        let mut entries = vec![entry(500, 0, 500), entry(0, 200, 300), entry(1000, 0, 1300)];
        entries[1].running_balance = Decimal::from(9999);

        let mismatches = reconcile(Decimal::ZERO, &entries);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].entry_id, entries[1].id);
        assert_eq!(mismatches[0].stored, Decimal::from(9999));
        assert_eq!(mismatches[0].projected, Decimal::from(300));
    }

    #[test]
    fn project_all_returns_final_balance() {
        let entries = vec![entry(500, 0, 500), entry(0, 200, 300)];
        assert_eq!(project_all(Decimal::ZERO, &entries), Decimal::from(300));
    }
}
