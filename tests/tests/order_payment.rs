//! Order payment: business failures commit, system failures roll back.

use pretty_assertions::assert_eq;
use txscope_tests::order::{INSUFFICIENT_FUNDS_CUSTOMER, SYSTEM_FAILURE_CUSTOMER};
use txscope_tests::prelude::*;

#[test]
fn test_complete() {
    // GIVEN
    let fixture = Fixture::new();
    let mut session = fixture.session();
    let mut order = Order::new(1, "normal");

    // WHEN
    OrderService::new().order(&mut session, &mut order).unwrap();

    // THEN
    let found = OrderRepository::find_by_id(&fixture.store, order.id).unwrap();
    assert_eq!(found.pay_status, Some(PayStatus::Complete));
}

#[test]
fn test_system_failure_rolls_back_order() {
    // GIVEN
    let fixture = Fixture::new();
    let mut session = fixture.session();
    let mut order = Order::new(2, SYSTEM_FAILURE_CUSTOMER);

    // WHEN
    let result = OrderService::new().order(&mut session, &mut order);

    // THEN
    assert!(matches!(result, Err(ServiceError::PaymentSystem { order: 2 })));
    assert!(OrderRepository::find_by_id(&fixture.store, order.id).is_none());
}

#[test]
fn test_business_failure_commits_waiting_order() {
    // GIVEN
    let fixture = Fixture::new();
    let mut session = fixture.session();
    let mut order = Order::new(3, INSUFFICIENT_FUNDS_CUSTOMER);

    // WHEN
    let result = OrderService::new().order(&mut session, &mut order);

    // THEN - the caller is told, and the order is kept as waiting
    let err = result.unwrap_err();
    assert!(matches!(err, ServiceError::NotEnoughMoney { order: 3 }));
    assert!(!err.is_infrastructure());
    let found = OrderRepository::find_by_id(&fixture.store, order.id).unwrap();
    assert_eq!(
        found,
        Order {
            id: 3,
            username: INSUFFICIENT_FUNDS_CUSTOMER.to_string(),
            pay_status: Some(PayStatus::Waiting),
        }
    );
    assert_eq!(fixture.store.commits(), 1);
}

#[test]
fn test_business_failure_in_joined_scope_keeps_owner_committable() {
    // GIVEN - the order service joins a caller-owned transaction
    let fixture = Fixture::new();
    let mut session = fixture.session();
    let mut order = Order::new(4, INSUFFICIENT_FUNDS_CUSTOMER);

    // WHEN - the caller treats the business failure as recovered
    let result: ServiceResult<()> =
        session.transactional(&TransactionDefinition::required(), |s, _| {
            let paid = OrderService::new().order(s, &mut order);
            assert!(matches!(paid, Err(ServiceError::NotEnoughMoney { .. })));
            Ok(())
        });

    // THEN - the joined scope committed logically, so the owner commits
    assert!(result.is_ok());
    let found = OrderRepository::find_by_id(&fixture.store, 4).unwrap();
    assert_eq!(found.pay_status, Some(PayStatus::Waiting));
}

#[test]
fn test_commit_fault_surfaces_as_infrastructure_failure() {
    let fixture = Fixture::new();
    let mut session = fixture.session();
    let mut order = Order::new(5, "normal");
    fixture.store.inject_fault(ResourceOp::Commit, "connection lost");

    let err = OrderService::new()
        .order(&mut session, &mut order)
        .unwrap_err();

    assert!(err.is_infrastructure());
    assert!(OrderRepository::find_by_id(&fixture.store, 5).is_none());
}
