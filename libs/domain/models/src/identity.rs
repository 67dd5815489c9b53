// [libs/domain/models/src/identity.rs]
/*!
 * APARATO: IDENTITY CONTRACT (ESTRATO L2)
 * El núcleo no emite estas credenciales; solo las consulta — role +
 * permission bitset inyectados por el llamador externo (fuera de
 * alcance de este crate).
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Accountant,
    Employee,
    Guard,
    Customer,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        const CREATE_ENTRY = 0b0000_0001;
        const ASSIGN_ROOM = 0b0000_0010;
        const ISSUE_GATE_PASS = 0b0000_0100;
        const APPROVE_GATE_PASS = 0b0000_1000;
        const RECORD_PICKUP = 0b0001_0000;
        const POST_LEDGER_ADJUSTMENT = 0b0010_0000;
        const MANAGE_STORAGE_ADMIN = 0b0100_0000;
        const TOGGLE_OPERATION_MODE = 0b1000_0000;
    }
}

/// Caller context threaded through every façade operation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub permissions: Permissions,
}

impl AuthContext {
    pub fn has(&self, permission: Permissions) -> bool {
        self.permissions.contains(permission)
    }
}
