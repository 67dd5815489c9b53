// [libs/domain/models/src/gate_pass.rs]
/*!
 * APARATO: GATE-PASS DOMAIN MODEL (ESTRATO L2)
 * CLASIFICACIÓN: STATE MACHINE CONTRACT
 *
 * The arithmetic and transition logic live in `coldstore-domain-gatepass`
 * (kept free of persistence concerns so the invariants of the design/§8
 * are unit-testable without a database). This module only defines the
 * row shapes and the closed status enum.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GatePassStatus {
    Pending,
    Approved,
    PartiallyCompleted,
    Completed,
    Expired,
    Rejected,
}

impl GatePassStatus {
    /// Statuses counted toward `committed(E)` — pending included is the
    /// first half of the "104 out of 52" production-bug fix.
    pub fn counts_toward_committed(self) -> bool {
        matches!(
            self,
            GatePassStatus::Pending | GatePassStatus::Approved | GatePassStatus::PartiallyCompleted
        )
    }

    /// Statuses counted toward `pickedUp(E)`.
    pub fn counts_toward_picked_up(self) -> bool {
        matches!(
            self,
            GatePassStatus::Approved | GatePassStatus::PartiallyCompleted | GatePassStatus::Completed
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GatePassStatus::Completed | GatePassStatus::Expired | GatePassStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePass {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub entry_id: Uuid,
    pub family_member_id: Option<Uuid>,
    pub requested_quantity: i64,
    pub approved_quantity: Option<i64>,
    /// Set when the sweeper expires a pass that was ever approved; final
    /// committed amount at the moment of expiry (the design invariant).
    pub final_approved_quantity: Option<i64>,
    pub total_picked_up: i64,
    pub status: GatePassStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub approval_expires_at: Option<DateTime<Utc>>,
    pub issued_by: Uuid,
    pub approved_by: Option<Uuid>,
}

impl GatePass {
    /// The reservation amount this pass contributes to `committed(E)`:
    /// `max(requested, approved.unwrap_or(0)) - total_picked_up`.
    pub fn committed_amount(&self) -> i64 {
        if !self.status.counts_toward_committed() {
            return 0;
        }
        let reserved = self.requested_quantity.max(self.approved_quantity.unwrap_or(0));
        (reserved - self.total_picked_up).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: Uuid,
    pub gate_pass_id: Uuid,
    pub quantity: i64,
    pub picked_up_at: DateTime<Utc>,
    pub handled_by: Uuid,
    pub source_room: String,
    pub source_floor: i16,
}

/// Per-gatar breakdown row of a Pickup, mirroring RoomEntry's Gatars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupGatar {
    pub id: Uuid,
    pub pickup_id: Uuid,
    pub gatar_number: i32,
    pub quantity: i64,
}
