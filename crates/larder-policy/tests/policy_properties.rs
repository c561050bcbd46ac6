//! Property tests for the access policy engine

use chrono::TimeZone;
use larder_core::{
    Actor, ActorId, Claim, ClaimStatus, Donation, DonationStatus, Role, Timestamp,
};
use larder_policy::{evaluate, AccessRequest, DenyReason, Operation, Resource, RuleProgram};
use proptest::prelude::*;

fn at() -> Timestamp {
    chrono::Utc.timestamp_millis_opt(1_714_555_800_125).unwrap()
}

/// Small id pool so ownership matches happen often
fn arb_actor_id() -> impl Strategy<Value = ActorId> {
    prop_oneof![Just("u1"), Just("u2"), Just("u3")].prop_map(ActorId::from)
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Donor), Just(Role::Recipient), Just(Role::Admin)]
}

fn arb_actor() -> impl Strategy<Value = Actor> {
    (arb_actor_id(), arb_role()).prop_map(|(id, role)| Actor { id, role })
}

fn arb_donation_status() -> impl Strategy<Value = DonationStatus> {
    proptest::sample::select(DonationStatus::ALL.to_vec())
}

fn arb_claim_status() -> impl Strategy<Value = ClaimStatus> {
    proptest::sample::select(ClaimStatus::ALL.to_vec())
}

fn arb_donation() -> impl Strategy<Value = Donation> {
    (
        prop_oneof![Just("d1"), Just("d2")],
        arb_actor_id(),
        arb_donation_status(),
    )
        .prop_map(|(id, owner, status)| {
            let mut donation = Donation::new(id, owner, "Apples", at());
            donation.status = status;
            donation
        })
}

fn arb_claim() -> impl Strategy<Value = Claim> {
    (
        prop_oneof![Just("c1"), Just("c2")],
        prop_oneof![Just("d1"), Just("d2")],
        arb_actor_id(),
        arb_claim_status(),
    )
        .prop_map(|(id, donation, holder, status)| {
            Claim::pending(id.into(), donation.into(), holder, at()).with_status(status)
        })
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    proptest::sample::select(Operation::ALL.to_vec())
}

fn arb_resource() -> impl Strategy<Value = Resource> {
    prop_oneof![
        4 => (
            proptest::option::weighted(0.9, arb_donation()),
            proptest::option::weighted(0.9, arb_donation()),
        )
            .prop_map(|(existing, proposed)| Resource::Donation { existing, proposed }),
        4 => (
            proptest::option::weighted(0.9, arb_claim()),
            proptest::option::weighted(0.9, arb_claim()),
            proptest::option::of(arb_actor_id()),
        )
            .prop_map(|(existing, proposed, donation_owner)| Resource::Claim {
                existing,
                proposed,
                donation_owner,
            }),
        1 => Just(Resource::Unknown),
    ]
}

fn arb_request() -> impl Strategy<Value = AccessRequest> {
    (
        proptest::option::weighted(0.9, arb_actor()),
        arb_operation(),
        arb_resource(),
    )
        .prop_map(|(actor, operation, resource)| AccessRequest::new(actor, operation, resource))
}

proptest! {
    #[test]
    fn non_owner_cannot_update_donations(
        existing in arb_donation(),
        proposed in arb_donation(),
        id in arb_actor_id(),
        role in prop_oneof![Just(Role::Donor), Just(Role::Recipient)],
    ) {
        prop_assume!(existing.owner_id != id);
        let request = AccessRequest::update_donation(&Actor { id, role }, existing, proposed);
        prop_assert!(!evaluate(&request).is_allowed());
    }

    #[test]
    fn owner_may_make_legal_status_moves(
        existing in arb_donation(),
        next in arb_donation_status(),
    ) {
        prop_assume!(existing.status.can_transition_to(next));
        let owner = Actor::donor(existing.owner_id.clone());
        let proposed = existing.with_status(next, at());
        let request = AccessRequest::update_donation(&owner, existing, proposed);
        prop_assert!(evaluate(&request).is_allowed());
    }

    #[test]
    fn owner_cannot_leave_terminal_status(
        existing in arb_donation(),
        next in arb_donation_status(),
    ) {
        prop_assume!(existing.status.is_terminal() && existing.status != next);
        let from = existing.status.as_str();
        let owner = Actor::donor(existing.owner_id.clone());
        let proposed = existing.with_status(next, at());
        let request = AccessRequest::update_donation(&owner, existing.clone(), proposed.clone());
        prop_assert_eq!(
            evaluate(&request).reason(),
            Some(DenyReason::IllegalTransition { from, to: next.as_str() })
        );

        let admin = Actor::admin("ops");
        let repair = AccessRequest::update_donation(&admin, existing, proposed);
        prop_assert!(evaluate(&repair).is_allowed());
    }

    #[test]
    fn claims_are_created_only_for_oneself(actor in arb_actor(), claim in arb_claim()) {
        let expected = actor.id == claim.user_id;
        let request = AccessRequest::create_claim(&actor, claim);
        prop_assert_eq!(evaluate(&request).is_allowed(), expected);
    }

    #[test]
    fn anonymous_requests_are_always_denied(request in arb_request()) {
        prop_assert!(!evaluate(&request.anonymous()).is_allowed());
    }

    #[test]
    fn evaluation_is_deterministic(request in arb_request()) {
        prop_assert_eq!(evaluate(&request), evaluate(&request.clone()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn rule_program_agrees_with_native_engine(request in arb_request()) {
        let program = RuleProgram::generate();
        let native = evaluate(&request);
        let datalog = program.evaluate(&request).unwrap();
        prop_assert_eq!(
            native.is_allowed(),
            datalog.is_allowed(),
            "native {} vs datalog {} for {:?}",
            native,
            datalog,
            request
        );
    }
}

#[test]
fn every_table_row_agrees_on_a_canonical_allow() {
    let program = RuleProgram::generate();
    let owner = Actor::donor("u1");
    let donation = Donation::new("d1", "u1", "Rice", at());
    let claim = Claim::pending("c1".into(), "d1".into(), "u1".into(), at());

    let requests = [
        AccessRequest::create_donation(&owner, donation.clone()),
        AccessRequest::read_donation(&owner, donation.clone()),
        AccessRequest::update_donation(
            &owner,
            donation.clone(),
            donation.with_status(DonationStatus::Claimed, at()),
        ),
        AccessRequest::delete_donation(&owner, donation),
        AccessRequest::create_claim(&owner, claim.clone()),
        AccessRequest::read_claim(&owner, claim.clone(), None),
        AccessRequest::update_claim(&owner, claim.clone(), claim.with_status(ClaimStatus::PickedUp)),
        AccessRequest::delete_claim(&owner, claim),
    ];
    for request in &requests {
        assert!(evaluate(request).is_allowed(), "{request:?}");
        assert!(program.evaluate(request).unwrap().is_allowed(), "{request:?}");
    }
}
