// [libs/domain/models/src/room_entry.rs]
/*!
 * APARATO: ROOM PLACEMENT DOMAIN MODEL (ESTRATO L2)
 * Invariant: sum of Gatar quantities equals the RoomEntry quantity.
 * Invariant: sum of RoomEntry quantities for a given Entry equals the
 * Entry's actual placed quantity (may differ from expected).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEntry {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub room: String,
    pub floor: i16,
    pub gatar_number: i32,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-gatar breakdown row owned by a RoomEntry (or mirrored by a Pickup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gatar {
    pub id: Uuid,
    pub room_entry_id: Uuid,
    pub gatar_number: i32,
    pub quantity: i64,
    pub quality_grade: Option<String>,
}

impl RoomEntry {
    /// `true` when the owned gatars sum to the RoomEntry's own quantity.
    pub fn gatars_balanced(quantity: i64, gatars: &[Gatar]) -> bool {
        gatars.iter().map(|g| g.quantity).sum::<i64>() == quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gatar(qty: i64) -> Gatar {
        Gatar {
            id: Uuid::new_v4(),
            room_entry_id: Uuid::new_v4(),
            gatar_number: 1,
            quantity: qty,
            quality_grade: None,
        }
    }

    #[test]
    fn balanced_when_sum_matches() {
        let gatars = vec![gatar(10), gatar(20)];
        assert!(RoomEntry::gatars_balanced(30, &gatars));
        assert!(!RoomEntry::gatars_balanced(31, &gatars));
    }
}
