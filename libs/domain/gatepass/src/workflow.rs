// [libs/domain/gatepass/src/workflow.rs]
/*!
 * APARATO: GATE-PASS WORKFLOW ASSEMBLY (ESTRATO L2)
 * Wires `engine`'s validation functions into full state transitions
 * that hand back the row the caller should persist. The repository
 * layer (`coldstore-infra-db::repositories::gate_pass`) is the only
 * caller: it loads the sibling rows under `FOR UPDATE`, calls these
 * functions, and writes the result back inside the same transaction.
 */

use chrono::{DateTime, Utc};
use coldstore_domain_models::{CoreError, GatePass, GatePassStatus};
use uuid::Uuid;

use crate::engine::{self, Placed};
use crate::policy::GatePassPolicy;

/// Builds a new `Pending` gate pass after validating it against the
/// entry's current reservation state. `sibling_passes` is every other
/// non-excluded gate pass against the same entry, loaded under lock.
#[allow(clippy::too_many_arguments)]
pub fn create_gate_pass(
    policy: &GatePassPolicy,
    now: DateTime<Utc>,
    entry_id: Uuid,
    customer_id: Uuid,
    family_member_id: Option<Uuid>,
    placed: Placed,
    sibling_passes: &[GatePass],
    requested_quantity: i64,
    issued_by: Uuid,
) -> Result<GatePass, CoreError> {
    engine::validate_create(entry_id, placed, sibling_passes, requested_quantity)?;

    Ok(GatePass {
            id: Uuid::new_v4(),
            customer_id,
            entry_id,
            family_member_id,
            requested_quantity,
            approved_quantity: None,
            final_approved_quantity: None,
            total_picked_up: 0,
            status: GatePassStatus::Pending,
            created_at: now,
            expires_at: now + policy.pending_window,
            approval_expires_at: None,
            issued_by,
            approved_by: None,
    })
}

/// Approves a `Pending` gate pass for `approved_quantity` (may differ
/// from `requested_quantity` — a guard can approve less than asked).
/// `sibling_passes` must exclude `pass` itself.
pub fn approve_gate_pass(
    policy: &GatePassPolicy,
    now: DateTime<Utc>,
    pass: &GatePass,
    placed: Placed,
    sibling_passes: &[GatePass],
    approved_quantity: i64,
    approved_by: Uuid,
) -> Result<GatePass, CoreError> {
    if pass.status != GatePassStatus::Pending {
        return Err(CoreError::IllegalStateTransition {
                entity: "GatePass",
                current_state: format!("{:?}", pass.status),
                attempted_transition: "approve",
        });
    }

    engine::validate_approve(pass.entry_id, placed, sibling_passes, approved_quantity)?;

    let mut approved = pass.clone();
    approved.approved_quantity = Some(approved_quantity);
    approved.status = GatePassStatus::Approved;
    approved.approval_expires_at = Some(now + policy.approval_window);
    approved.approved_by = Some(approved_by);
    Ok(approved)
}

/// Rejects a `Pending` gate pass outright, releasing its reservation.
pub fn reject_gate_pass(pass: &GatePass) -> Result<GatePass, CoreError> {
    if pass.status != GatePassStatus::Pending {
        return Err(CoreError::IllegalStateTransition {
                entity: "GatePass",
                current_state: format!("{:?}", pass.status),
                attempted_transition: "reject",
        });
    }
    let mut rejected = pass.clone();
    rejected.final_approved_quantity = Some(0);
    rejected.status = GatePassStatus::Rejected;
    Ok(rejected)
}

/// Applies a pickup to `pass`, returning the row to persist alongside
/// the `Pickup`/`PickupGatar` rows the caller inserts in the same
/// transaction.
pub fn apply_pickup(pass: &GatePass, pickup_qty: i64, now: DateTime<Utc>) -> Result<GatePass, CoreError> {
    let outcome = engine::record_pickup(pass, pickup_qty, now)?;
    let mut updated = pass.clone();
    updated.total_picked_up = outcome.new_total_picked_up;
    updated.status = outcome.new_status;
    if updated.status == GatePassStatus::Completed {
        updated.final_approved_quantity = updated.approved_quantity;
    }
    Ok(updated)
}

/// Sweeps a batch of passes, returning only those that changed state
/// (the caller persists these and leaves the rest untouched).
pub fn sweep_expired(passes: &[GatePass], now: DateTime<Utc>) -> Vec<GatePass> {
    passes
    .iter()
    .filter(|p| engine::should_expire(p, now))
    .map(|p| {
            let mut expired = p.clone();
            engine::expire(&mut expired);
            expired
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> GatePassPolicy {
        GatePassPolicy::default()
    }

    #[test]
    fn full_lifecycle_create_approve_partial_pickup_complete() {
        let now = Utc::now();
        let entry_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let issuer = Uuid::new_v4();
        let guard = Uuid::new_v4();

        let pass = create_gate_pass(&policy(), now, entry_id, customer_id, None, 52, &[], 40, issuer).unwrap();
        assert_eq!(pass.status, GatePassStatus::Pending);
        assert_eq!(pass.expires_at, now + Duration::hours(30));

        let approved = approve_gate_pass(&policy(), now, &pass, 52, &[], 40, guard).unwrap();
        assert_eq!(approved.status, GatePassStatus::Approved);
        assert_eq!(approved.approval_expires_at, Some(now + Duration::hours(15)));

        let partial = apply_pickup(&approved, 15, now).unwrap();
        assert_eq!(partial.status, GatePassStatus::PartiallyCompleted);

        let complete = apply_pickup(&partial, 25, now).unwrap();
        assert_eq!(complete.status, GatePassStatus::Completed);
        assert_eq!(complete.final_approved_quantity, Some(40));
        assert_eq!(engine::physical(52, &[complete]), 12);
    }

    #[test]
    fn approval_cannot_exceed_recomputed_availability() {
        let now = Utc::now();
        let entry_id = Uuid::new_v4();

        // Another approved pass already reserves 30 of the 52 placed.
        let other = GatePass {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            entry_id,
            family_member_id: None,
            requested_quantity: 30,
            approved_quantity: Some(30),
            final_approved_quantity: None,
            total_picked_up: 0,
            status: GatePassStatus::Approved,
            created_at: now,
            expires_at: now + Duration::hours(30),
            approval_expires_at: Some(now + Duration::hours(15)),
            issued_by: Uuid::new_v4(),
            approved_by: Some(Uuid::new_v4()),
        };

        let pending = create_gate_pass(&policy(), now, entry_id, Uuid::new_v4(), None, 52, &[other.clone()], 22, Uuid::new_v4()).unwrap();

        let err = approve_gate_pass(&policy(), now, &pending, 52, &[other], 25, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock {.. }));
    }

    #[test]
    fn sweep_only_touches_expired_rows() {
        let now = Utc::now();
        let mut expired_pending = GatePass {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            entry_id: Uuid::new_v4(),
            family_member_id: None,
            requested_quantity: 10,
            approved_quantity: None,
            final_approved_quantity: None,
            total_picked_up: 0,
            status: GatePassStatus::Pending,
            created_at: now - Duration::hours(31),
            expires_at: now - Duration::hours(1),
            approval_expires_at: None,
            issued_by: Uuid::new_v4(),
            approved_by: None,
        };
        let fresh = create_gate_pass(&policy(), now, Uuid::new_v4(), Uuid::new_v4(), None, 52, &[], 5, Uuid::new_v4()).unwrap();

        let swept = sweep_expired(&[expired_pending.clone(), fresh.clone()], now);
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, expired_pending.id);

        engine::expire(&mut expired_pending);
        assert_eq!(swept[0].status, expired_pending.status);
    }
}
