//! Overdue sweep, debt checks and repayment.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use bnpl_core::{BnplError, Clock, InstallmentId, InstallmentStatus, PlanStatus, UserStatus};
use common::{amount, installment_ids, uid, TestHarness};

// ============================================================================
// Overdue sweep
// ============================================================================

#[test]
fn sweep_marks_past_due_installments_overdue() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "1500.00", 3);

    harness.clock.advance_days(31);
    let report = harness.ledger.sweep_overdue().unwrap();
    assert_eq!(report.updated_count, 1);
    assert_eq!(report.affected_users, vec![user.user_id.clone()]);

    let details = harness.ledger.get_plan(&plan.plan.id).unwrap();
    assert_eq!(details.installments[0].status, InstallmentStatus::Overdue);
    assert_eq!(details.installments[1].status, InstallmentStatus::Upcoming);

    let summary = harness.ledger.check_debt(&user.user_id).unwrap();
    assert!(summary.has_overdue);
    assert_eq!(summary.total_debt, amount("500.00"));
    assert_eq!(summary.overdue_installments.len(), 1);
    assert_eq!(summary.user_status, UserStatus::DebtUser);
}

#[test]
fn installment_due_today_is_not_overdue() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    harness.plan(&user, "1500.00", 3);

    harness.clock.advance_days(30);
    let report = harness.ledger.sweep_overdue().unwrap();
    assert_eq!(report.updated_count, 0);
    assert_eq!(
        harness.ledger.get_user(&user.user_id).unwrap().status,
        UserStatus::Normal
    );
}

#[test]
fn second_sweep_updates_nothing() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    harness.plan(&user, "1500.00", 3);

    harness.clock.advance_days(31);
    assert_eq!(harness.ledger.sweep_overdue().unwrap().updated_count, 1);

    let second = harness.ledger.sweep_overdue().unwrap();
    assert_eq!(second.updated_count, 0);
    assert!(second.affected_users.is_empty());
}

#[test]
fn sweep_covers_multiple_users_and_installments() {
    let harness = TestHarness::new();
    let alice = harness.register("alice");
    let bob = harness.register("bob");
    let carol = harness.register("carol");
    harness.plan(&alice, "300.00", 3);
    harness.plan(&bob, "300.00", 3);
    harness.clock.advance_days(40);
    harness.plan(&carol, "300.00", 3);

    harness.clock.advance_days(25);
    let report = harness.ledger.sweep_overdue().unwrap();
    assert_eq!(report.updated_count, 4);
    assert_eq!(report.affected_users, vec![alice.user_id.clone(), bob.user_id.clone()]);

    assert_eq!(
        harness.ledger.check_debt(&alice.user_id).unwrap().total_debt,
        amount("200.00")
    );
    assert_eq!(
        harness.ledger.get_user(&carol.user_id).unwrap().status,
        UserStatus::Normal
    );
}

// ============================================================================
// Debt check
// ============================================================================

#[test]
fn check_debt_without_overdue() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    harness.plan(&user, "1500.00", 3);

    let summary = harness.ledger.check_debt(&user.user_id).unwrap();
    assert!(!summary.has_overdue);
    assert_eq!(summary.total_debt, amount("0.00"));
    assert!(summary.overdue_installments.is_empty());
    assert_eq!(summary.user_status, UserStatus::Normal);
}

#[test]
fn check_debt_unknown_user() {
    let harness = TestHarness::new();
    assert!(harness.ledger.check_debt(&uid("ghost")).unwrap_err().is_not_found());
}

// ============================================================================
// Repayment
// ============================================================================

#[test]
fn repay_restores_normal_status() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "1500.00", 3);
    harness.make_first_installment_overdue();

    let first = plan.installments[0].id;
    let receipt = harness
        .ledger
        .repay(&user.user_id, &[first], None)
        .unwrap()
        .into_inner();
    assert_eq!(receipt.paid_installments, 1);
    assert_eq!(receipt.installment_ids, vec![first]);
    assert_eq!(receipt.user_status, UserStatus::Normal);
    assert!(receipt.completed_plans.is_empty());

    let details = harness.ledger.get_plan(&plan.plan.id).unwrap();
    let paid = &details.installments[0];
    assert_eq!(paid.status, InstallmentStatus::Paid);
    assert_eq!(paid.paid_at, Some(harness.clock.now()));
    assert_eq!(details.plan.status, PlanStatus::Active);

    let summary = harness.ledger.check_debt(&user.user_id).unwrap();
    assert!(!summary.has_overdue);
    assert_eq!(summary.user_status, UserStatus::Normal);
}

#[test]
fn partial_repayment_keeps_debt_status() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "1500.00", 3);
    harness.clock.advance_days(61);
    harness.ledger.sweep_overdue().unwrap();

    let receipt = harness
        .ledger
        .repay(&user.user_id, &[plan.installments[0].id], None)
        .unwrap()
        .into_inner();
    assert_eq!(receipt.user_status, UserStatus::DebtUser);
    assert_eq!(
        harness.ledger.check_debt(&user.user_id).unwrap().total_debt,
        amount("500.00")
    );
}

#[test]
fn repaying_every_installment_completes_plan() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "100.00", 3);
    harness.clock.advance_days(91);
    assert_eq!(harness.ledger.sweep_overdue().unwrap().updated_count, 3);

    let receipt = harness
        .ledger
        .repay(&user.user_id, &installment_ids(&plan), None)
        .unwrap()
        .into_inner();
    assert_eq!(receipt.paid_installments, 3);
    assert_eq!(receipt.completed_plans, vec![plan.plan.id]);
    assert_eq!(
        harness.ledger.get_plan(&plan.plan.id).unwrap().plan.status,
        PlanStatus::Completed
    );
}

#[test]
fn repay_with_non_overdue_installment_changes_nothing() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "1500.00", 3);
    harness.make_first_installment_overdue();

    let ids = [plan.installments[0].id, plan.installments[1].id];
    let err = harness.ledger.repay(&user.user_id, &ids, None).unwrap_err();
    assert!(matches!(err, BnplError::Validation(_)));

    let details = harness.ledger.get_plan(&plan.plan.id).unwrap();
    assert_eq!(details.installments[0].status, InstallmentStatus::Overdue);
    assert!(details.installments[0].paid_at.is_none());
    assert_eq!(
        harness.ledger.get_user(&user.user_id).unwrap().status,
        UserStatus::DebtUser
    );
}

#[test]
fn repay_rejects_bad_requests() {
    let harness = TestHarness::new();
    let alice = harness.register("alice");
    let bob = harness.register("bob");
    let plan = harness.plan(&alice, "1500.00", 3);
    harness.make_first_installment_overdue();
    let first = plan.installments[0].id;

    let cases: [(&str, Vec<InstallmentId>); 4] = [
        ("alice", vec![]),
        ("alice", vec![first, first]),
        ("alice", vec![InstallmentId::generate()]),
        ("bob", vec![first]),
    ];
    for (user, ids) in cases {
        let err = harness.ledger.repay(&uid(user), &ids, None).unwrap_err();
        assert!(matches!(err, BnplError::Validation(_)), "{user} {ids:?}: {err}");
    }

    assert!(harness
        .ledger
        .repay(&uid("ghost"), &[first], None)
        .unwrap_err()
        .is_not_found());

    assert_eq!(
        harness.ledger.check_debt(&alice.user_id).unwrap().total_debt,
        amount("500.00")
    );
    assert_eq!(
        harness.ledger.get_user(&bob.user_id).unwrap().status,
        UserStatus::Normal
    );
}

#[test]
fn repay_twice_fails_the_second_time() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let plan = harness.plan(&user, "1500.00", 3);
    harness.make_first_installment_overdue();
    let first = [plan.installments[0].id];

    harness.ledger.repay(&user.user_id, &first, None).unwrap();
    let err = harness.ledger.repay(&user.user_id, &first, None).unwrap_err();
    assert!(matches!(err, BnplError::Validation(_)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_sweeps_and_repayments_keep_status_consistent() {
    let harness = TestHarness::new();
    let users: Vec<_> = (0..8)
        .map(|n| harness.register(&format!("usr-{n}")))
        .collect();
    let plans: Vec<_> = users.iter().map(|u| harness.plan(u, "300.00", 3)).collect();
    harness.make_first_installment_overdue();

    let mut handles = Vec::new();
    for (user, plan) in users.iter().zip(&plans) {
        let ledger = Arc::clone(&harness.ledger);
        let user_id = user.user_id.clone();
        let first = plan.installments[0].id;
        handles.push(thread::spawn(move || {
            ledger.repay(&user_id, &[first], None).unwrap();
        }));

        let ledger = Arc::clone(&harness.ledger);
        handles.push(thread::spawn(move || {
            ledger.sweep_overdue().unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for user in &users {
        let summary = harness.ledger.check_debt(&user.user_id).unwrap();
        assert!(!summary.has_overdue);
        assert_eq!(summary.user_status, UserStatus::Normal);
    }
}

#[test]
fn repayment_racing_a_sweep_of_the_next_installment_keeps_user_in_debt() {
    for _ in 0..50 {
        let harness = TestHarness::new();
        let user = harness.register("mock-usr-001");
        let plan = harness.plan(&user, "300.00", 3);
        harness.make_first_installment_overdue();
        harness.clock.advance_days(30);

        let start = Arc::new(Barrier::new(2));
        let repayment = {
            let ledger = Arc::clone(&harness.ledger);
            let start = Arc::clone(&start);
            let user_id = user.user_id.clone();
            let first = plan.installments[0].id;
            thread::spawn(move || {
                start.wait();
                ledger.repay(&user_id, &[first], None).unwrap();
            })
        };
        let sweep = {
            let ledger = Arc::clone(&harness.ledger);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                ledger.sweep_overdue().unwrap();
            })
        };
        repayment.join().unwrap();
        sweep.join().unwrap();

        let details = harness.ledger.get_plan(&plan.plan.id).unwrap();
        assert_eq!(details.installments[0].status, InstallmentStatus::Paid);
        assert_eq!(details.installments[1].status, InstallmentStatus::Overdue);
        assert_eq!(details.installments[2].status, InstallmentStatus::Upcoming);

        let summary = harness.ledger.check_debt(&user.user_id).unwrap();
        assert!(summary.has_overdue);
        assert_eq!(summary.total_debt, amount("100.00"));
        assert_eq!(summary.user_status, UserStatus::DebtUser);
        assert_eq!(
            harness.ledger.get_user(&user.user_id).unwrap().status,
            UserStatus::DebtUser
        );
    }
}
