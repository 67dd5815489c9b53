// [libs/domain/models/src/ledger.rs]
/*!
 * APARATO: LEDGER & BILLING DOMAIN MODELS (ESTRATO L2)
 * Append-only; rows are never mutated. Corrections are expressed as
 * new CREDIT/REFUND/ADJUSTMENT rows.
 */

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerEntryKind {
    Charge,
    Payment,
    Credit,
    Refund,
    DebtApproval,
    Adjustment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: LedgerEntryKind,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
    pub running_balance: Decimal,
    /// (source kind, source id) — e.g. ("entry", entry.id) or ("rent_payment", payment.id).
    pub source_kind: String,
    pub source_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// `new_balance = prev + debit - credit` (the design insert contract).
    pub fn project_balance(previous_balance: Decimal, debit: Decimal, credit: Decimal) -> Decimal {
        previous_balance + debit - credit
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DebtRequestStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Used,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub requested_by: Uuid,
    pub reason: String,
    pub status: DebtRequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentPayment {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// `RCP-YYYYMMDD-NNNN`, daily-sequential, zero-padded to 4.
    pub receipt_number: String,
    pub amount: Decimal,
    pub received_by: Uuid,
    pub received_at: DateTime<Utc>,
}

/// Formats the stable receipt number `RCP-YYYYMMDD-NNNN`.
pub fn format_receipt_number(date: chrono::NaiveDate, daily_sequence: u32) -> String {
    format!("RCP-{}-{:04}", date.format("%Y%m%d"), daily_sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn formats_receipt_number() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        assert_eq!(format_receipt_number(date, 7), "RCP-20260728-0007");
    }

    #[test]
    fn projects_running_balance() {
        let balance = LedgerEntry::project_balance(Decimal::from(1000), Decimal::from(500), Decimal::from(200));
        assert_eq!(balance, Decimal::from(1300));
    }
}
