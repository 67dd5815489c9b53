// [libs/domain/models/src/customer.rs]
/*!
 * APARATO: CUSTOMER & FAMILY DOMAIN MODELS (ESTRATO L2)
 * Customer is identified by a unique 10-digit phone; retired only
 * (soft-delete, no hard delete — see the design).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    /// Unique 10-digit phone number.
    pub phone: String,
    pub display_name: String,
    pub father_name: Option<String>,
    pub village: Option<String>,
    pub created_at: DateTime<Utc>,
    pub retired_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.retired_at.is_none()
    }
}

/// Belongs to exactly one Customer; phone unique within that customer's set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub phone: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
