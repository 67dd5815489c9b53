// [libs/domain/models/src/mode.rs]
/*!
 * APARATO: OPERATION-MODE GATE (ESTRATO L2)
 * Facility-wide Loading/Unloading toggle that gates which mutations the
 * façade accepts. This is policy, not an invariant of the gate-pass
 * engine itself.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationMode {
    /// Entry placement (RoomEntry creation) is accepted.
    Loading,
    /// Gate-pass create/approve and pickups are accepted.
    Unloading,
}

impl OperationMode {
    pub fn allows_entry_placement(self) -> bool {
        matches!(self, OperationMode::Loading)
    }

    pub fn allows_gate_pass_operations(self) -> bool {
        matches!(self, OperationMode::Unloading)
    }
}
