// [libs/domain/models/src/entry.rs]
/*!
 * APARATO: ENTRY (LOT / THOCK) DOMAIN MODEL (ESTRATO L2)
 * Thock identifier format `NNNN/QQ`: two monotonic sequences mint the
 * `NNNN` portion — seed starting at 1, sell starting at 1501.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryCategory {
    Seed,
    Sell,
}

impl EntryCategory {
    /// Starting value of the `NNNN` sequence for this category, per the design
    pub fn sequence_start(self) -> i64 {
        match self {
            EntryCategory::Seed => 1,
            EntryCategory::Sell => 1501,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub family_member_id: Option<Uuid>,
    /// `NNNN/QQ` — unique, wire-format-stable.
    pub thock_number: String,
    pub category: EntryCategory,
    pub expected_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Formats the stable thock identifier `NNNN/QQ`.
///
/// `quarter` is the season/quarter code (01-04 in this facility's
/// calendar); `sequence` is the per-category monotonic counter.
pub fn format_thock_number(sequence: i64, quarter: u8) -> String {
    format!("{:04}/{:02}", sequence, quarter)
}

/// Parses a `NNNN/QQ` thock identifier back into its two fields.
pub fn parse_thock_number(thock: &str) -> Option<(i64, u8)> {
    let (seq, quarter) = thock.split_once('/')?;
    let sequence: i64 = seq.parse().ok()?;
    let quarter: u8 = quarter.parse().ok()?;
    Some((sequence, quarter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_round_trip() {
        let thock = format_thock_number(1501, 2);
        assert_eq!(thock, "1501/02");
        assert_eq!(parse_thock_number(&thock), Some((1501, 2)));
    }

    #[test]
    fn sequence_start_matches_category() {
        assert_eq!(EntryCategory::Seed.sequence_start(), 1);
        assert_eq!(EntryCategory::Sell.sequence_start(), 1501);
    }
}
