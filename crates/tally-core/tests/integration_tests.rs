//! Integration tests for tally-core
//!
//! These tests exercise the full optimistic create → HTTP service →
//! reconcile workflow against the mock transaction service server.

use std::time::Duration;

use tally_core::test_utils::MockApiServer;
use tally_core::{
    import::parse_csv, Coordinator, CoordinatorOptions, Error, HttpTransactionService,
    ListFilters, RawTransactionInput, ReconcileOutcome, RevertPolicy, TransactionClient,
    TransactionKind,
};

fn raw(json: serde_json::Value) -> RawTransactionInput {
    serde_json::from_value(json).expect("raw input")
}

fn http_coordinator(server: &MockApiServer) -> Coordinator {
    let client = TransactionClient::Http(HttpTransactionService::new(&server.url()));
    Coordinator::new(
        client,
        CoordinatorOptions {
            request_timeout: Duration::from_secs(5),
            revert_policy: RevertPolicy::Discard,
            stale_after: Duration::from_secs(120),
        },
    )
}

#[tokio::test]
async fn test_optimistic_create_over_http() {
    let server = MockApiServer::start().await;
    let mut coord = http_coordinator(&server);

    let result = coord
        .create(raw(serde_json::json!({
            "amount": "₹1,234.56 INR",
            "type": "expense",
            "category": "Food",
            "description": "team lunch"
        })))
        .await
        .expect("create");

    // Currency string normalized before it ever went on the wire
    assert_eq!(result.record.amount, 1234.56);
    assert_eq!(result.record.id.as_deref(), Some("srv-1"));
    assert!(matches!(result.outcome, ReconcileOutcome::Matched { .. }));

    // Optimistic entry evicted, confirmed record in place, stats settled
    assert!(coord.pending().is_empty());
    assert_eq!(coord.confirmed().len(), 1);
    assert_eq!(coord.stats().total_expenses, 1234.56);
    assert_eq!(server.record_count(), 1);
}

#[tokio::test]
async fn test_server_failure_reverts_over_http() {
    let server = MockApiServer::start().await;
    server.set_fail(true);
    let mut coord = http_coordinator(&server);

    let err = coord
        .create(raw(serde_json::json!({
            "amount": 100,
            "type": "income",
            "category": "Salary"
        })))
        .await
        .expect_err("create should fail");

    assert!(matches!(err, Error::Service(_)));
    assert!(coord.pending().is_empty());
    assert_eq!(coord.stats().transaction_count, 0);
    assert_eq!(server.record_count(), 0);
}

#[tokio::test]
async fn test_update_delete_refresh_over_http() {
    let server = MockApiServer::start().await;
    let mut coord = http_coordinator(&server);

    let a = coord
        .create(raw(serde_json::json!({
            "amount": 50, "type": "expense", "category": "Food"
        })))
        .await
        .expect("create a");
    coord
        .create(raw(serde_json::json!({
            "amount": 800, "type": "income", "category": "Salary"
        })))
        .await
        .expect("create b");

    let id = a.record.id.clone().expect("server id");
    let updated = coord
        .update(&id, &raw(serde_json::json!({"amount": 75})))
        .await
        .expect("update");
    assert_eq!(updated.amount, 75.0);
    assert_eq!(coord.stats().total_expenses, 75.0);
    assert_eq!(coord.stats().net_balance, 725.0);

    coord.delete(&id).await.expect("delete");
    assert_eq!(coord.stats().transaction_count, 1);
    assert_eq!(server.record_count(), 1);

    let count = coord.refresh(&ListFilters::default()).await.expect("refresh");
    assert_eq!(count, 1);
    assert_eq!(coord.confirmed()[0].kind, TransactionKind::Income);
}

#[tokio::test]
async fn test_csv_import_submitted_through_coordinator() {
    let server = MockApiServer::start().await;
    let mut coord = http_coordinator(&server);

    let csv = "Date,Description,Amount,Type,Category\n\
               15/03/2024,NETFLIX.COM,15.99,expense,Entertainment\n\
               16/03/2024,SALARY MARCH,\"2,500.00\",income,Salary\n";
    let inputs = parse_csv(csv.as_bytes()).expect("parse csv");
    assert_eq!(inputs.len(), 2);

    for input in inputs {
        coord.create(input).await.expect("submit row");
    }

    assert!(coord.pending().is_empty());
    assert_eq!(coord.stats().transaction_count, 2);
    assert_eq!(coord.stats().total_income, 2500.0);
    assert_eq!(coord.stats().total_expenses, 15.99);
    assert_eq!(server.record_count(), 2);
}

#[tokio::test]
async fn test_failure_then_recovery_with_retain_policy() {
    let server = MockApiServer::start().await;
    let client = TransactionClient::Http(HttpTransactionService::new(&server.url()));
    let mut coord = Coordinator::new(
        client,
        CoordinatorOptions {
            request_timeout: Duration::from_secs(5),
            revert_policy: RevertPolicy::RetainForRetry,
            stale_after: Duration::from_secs(120),
        },
    );

    server.set_fail(true);
    coord
        .create(raw(serde_json::json!({
            "amount": 42, "type": "expense", "category": "Food"
        })))
        .await
        .expect_err("first attempt fails");

    // Entry retained; the user can see it and retry
    assert_eq!(coord.pending().len(), 1);
    assert_eq!(coord.stats().total_expenses, 42.0);
    let temp_id = coord.awaiting_retry().remove(0);

    server.set_fail(false);
    let result = coord.retry(&temp_id).await.expect("retry succeeds");
    assert!(matches!(result.outcome, ReconcileOutcome::Matched { .. }));
    assert!(coord.pending().is_empty());
    assert_eq!(coord.stats().total_expenses, 42.0);
    assert_eq!(server.record_count(), 1);
}
