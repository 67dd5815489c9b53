// [libs/domain/gatepass/src/policy.rs]
/*!
 * APARATO: GATE-PASS WINDOW POLICY (ESTRATO L2)
 * Configurable pending/approval windows. This leaves the exact
 * window lengths an Open Question; DESIGN.md records the decision to
 * keep them as policy (defaulting to the values observed in the
 * original system: 30h to approve, 15h to pick up after approval)
 * rather than hard-coded constants, so an operator can tune them
 * without a code change.
 */

use chrono::Duration;

#[derive(Debug, Clone, Copy)]
pub struct GatePassPolicy {
    /// How long a `Pending` gate pass reserves stock before the sweeper
    /// expires it unapproved.
    pub pending_window: Duration,
    /// How long an `Approved`/`PartiallyCompleted` gate pass may still be
    /// picked up from before the sweeper expires the remainder.
    pub approval_window: Duration,
}

impl Default for GatePassPolicy {
    fn default() -> Self {
        Self {
            pending_window: Duration::hours(30),
            approval_window: Duration::hours(15),
        }
    }
}
