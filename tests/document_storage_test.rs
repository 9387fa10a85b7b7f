//! Integration tests for the document-store backend over the in-memory collection

use chrono::NaiveDate;
use ledgersync::adapters::document::{DocumentCollection, DocumentStorage, MemoryCollection};
use ledgersync::adapters::storage::{FetchResult, TransactionStorage};
use ledgersync::domain::{AccountId, MetadataPatch, Transaction, TransactionKey, METADATA_FIELD};
use serde_json::json;

const ACCOUNT: &str = "acc-checking";

fn txn(id: &str, date: &str, amount: f64) -> Transaction {
    Transaction::from_value(json!({
        "account_id": ACCOUNT,
        "transaction_id": id,
        "amount": amount,
        "iso_currency_code": "USD",
        "category": ["Travel", "Taxi"],
        "date": date,
        "authorized_date": date,
        "name": "Uber 063015 SF**POOL**",
        "pending": false,
        "payment_channel": "online",
    }))
    .unwrap()
}

fn storage() -> DocumentStorage<MemoryCollection> {
    DocumentStorage::new(
        MemoryCollection::new("transactions"),
        AccountId::new(ACCOUNT).unwrap(),
    )
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ids(result: &FetchResult) -> Vec<&str> {
    result
        .transactions
        .iter()
        .map(|s| s.transaction.transaction_id.as_str())
        .collect()
}

#[tokio::test]
async fn test_insert_writes_initial_metadata() {
    let storage = storage();
    storage
        .save_transactions(&[txn("T1", "2024-03-01", 6.33)])
        .await
        .unwrap();

    let fetched = storage.get_transactions(None, None, true).await.unwrap();
    let metadata = fetched.transactions[0].metadata.as_ref().unwrap();
    assert!(!metadata.pulled_to_file);
    assert!(metadata.date_downloaded.is_some());
    assert!(metadata.tags.is_empty());
    assert_eq!(fetched.transactions[0].transaction.date, d("2024-03-01"));
}

#[tokio::test]
async fn test_resave_keeps_metadata_and_refreshes_core() {
    let storage = storage();
    storage
        .save_transactions(&[txn("T1", "2024-03-01", 6.33)])
        .await
        .unwrap();
    storage
        .update_transaction(
            &[MetadataPatch::new("T1")
                .unwrap()
                .payee("Uber")
                .posting_account("Expenses:Transport")
                .tags(["ride", "work"])],
            Some(true),
        )
        .await
        .unwrap();
    let before = storage.get_transactions(None, None, false).await.unwrap();

    let summary = storage
        .save_transactions(&[txn("T1", "2024-03-01", 7.00)])
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.inserted, 0);

    let after = storage.get_transactions(None, None, false).await.unwrap();
    assert_eq!(after.transactions[0].transaction.amount, 7.00);
    assert_eq!(after.transactions[0].metadata, before.transactions[0].metadata);
    assert!(storage.get_transactions(None, None, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_transactions_skipped() {
    let storage = storage();
    let mut pending = txn("T2", "2024-03-02", 1.0);
    pending.pending = true;

    let summary = storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0), pending])
        .await
        .unwrap();
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.skipped_pending, 1);
    assert_eq!(storage.collection().len().await, 1);
}

#[tokio::test]
async fn test_range_inclusive_and_ordered() {
    let storage = storage();
    storage
        .save_transactions(&[
            txn("T3", "2024-03-20", 1.0),
            txn("T1", "2024-03-01", 1.0),
            txn("T4", "2024-04-01", 1.0),
            txn("T2", "2024-03-10", 1.0),
        ])
        .await
        .unwrap();

    let fetched = storage
        .get_transactions(Some(d("2024-03-01")), Some(d("2024-03-20")), false)
        .await
        .unwrap();
    assert_eq!(ids(&fetched), vec!["T1", "T2", "T3"]);

    let all = storage.get_transactions(None, None, false).await.unwrap();
    assert_eq!(ids(&all), vec!["T1", "T2", "T3", "T4"]);
}

#[tokio::test]
async fn test_check_pending_tracks_exports() {
    let storage = storage();
    assert!(!storage.check_pending().await.unwrap());

    storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0)])
        .await
        .unwrap();
    assert!(storage.check_pending().await.unwrap());

    storage
        .update_transaction(&[MetadataPatch::new("T1").unwrap()], Some(true))
        .await
        .unwrap();
    assert!(!storage.check_pending().await.unwrap());
}

#[tokio::test]
async fn test_mark_false_reopens_transaction() {
    let storage = storage();
    storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0)])
        .await
        .unwrap();
    storage
        .update_transaction(&[MetadataPatch::new("T1").unwrap()], Some(true))
        .await
        .unwrap();
    storage
        .update_transaction(&[MetadataPatch::new("T1").unwrap()], Some(false))
        .await
        .unwrap();

    let new_only = storage.get_transactions(None, None, true).await.unwrap();
    assert_eq!(ids(&new_only), vec!["T1"]);
}

#[tokio::test]
async fn test_unknown_patch_target_counted_missing() {
    let storage = storage();
    storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0)])
        .await
        .unwrap();

    let summary = storage
        .update_transaction(
            &[
                MetadataPatch::new("T1").unwrap(),
                MetadataPatch::new("GONE").unwrap(),
            ],
            Some(true),
        )
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.missing, 1);
}

#[tokio::test]
async fn test_malformed_document_reported_without_failing_query() {
    let storage = storage();
    storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0)])
        .await
        .unwrap();

    let key = TransactionKey::new(
        AccountId::new(ACCOUNT).unwrap(),
        "BROKEN".parse().unwrap(),
    );
    storage
        .collection()
        .create(
            &key,
            json!({
                "id": "BROKEN",
                "account_id": ACCOUNT,
                "transaction_id": "BROKEN",
                "date": "2024-03-02T00:00:00Z",
                METADATA_FIELD: {"pulled_to_file": false},
            }),
        )
        .await
        .unwrap();

    let fetched = storage.get_transactions(None, None, true).await.unwrap();
    assert_eq!(ids(&fetched), vec!["T1"]);
    assert_eq!(fetched.malformed.len(), 1);
    assert_eq!(fetched.malformed[0].transaction_id, "BROKEN");
}

#[tokio::test]
async fn test_latest_transaction_date() {
    let storage = storage();
    assert_eq!(storage.latest_transaction_date().await.unwrap(), None);

    storage
        .save_transactions(&[
            txn("T1", "2024-03-01", 1.0),
            txn("T2", "2024-05-09", 1.0),
        ])
        .await
        .unwrap();
    assert_eq!(
        storage.latest_transaction_date().await.unwrap(),
        Some(d("2024-05-09"))
    );
}

#[tokio::test]
async fn test_transactions_of_other_accounts_are_not_saved() {
    let storage = storage();
    let mut foreign = txn("T9", "2024-03-04", 9.0);
    foreign.account_id = AccountId::new("acc-savings").unwrap();

    let summary = storage
        .save_transactions(&[txn("T1", "2024-03-01", 1.0), foreign])
        .await
        .unwrap();
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.skipped_foreign, 1);
    assert_eq!(storage.collection().len().await, 1);

    // Nothing unreadable is left behind for the pending check
    storage
        .update_transaction(&[MetadataPatch::new("T1").unwrap()], Some(true))
        .await
        .unwrap();
    assert!(!storage.check_pending().await.unwrap());
}
