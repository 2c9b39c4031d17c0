//! PostgreSQL store tests.
//!
//! These need a reachable database in `DATABASE_URL` and run with
//! `cargo test -p simhash-db -- --ignored`. Each test owns its schema.

use simhash_core::{BandStore, Fingerprint, IndexConfig, NearDuplicateIndex};
use simhash_db::{DbConfig, PgBandStore};

const DOCS: [&str; 4] = [
    "How are you? I Am fine. blar blar blar blar blar Thanks.",
    "How are you i am fine. blar blar blar blar blar than",
    "This is simhash test.",
    "How are you i am fine. blar blar blar blar blar thank1",
];

const QUERY: &str = "How are you i am fine.ablar ablar xyz blar blar blar blar blar blar blar thank";

async fn store(schema: &str) -> PgBandStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("simhash=debug")
        .with_test_writer()
        .try_init();

    let config = DbConfig {
        schema: schema.to_string(),
        ..DbConfig::from_env()
    };
    config.open_store().await.expect("DATABASE_URL must point at a running PostgreSQL")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_get_near_dups() {
    let store = store("simhash_test_near_dups").await;
    let objs: Vec<Fingerprint> = DOCS.iter().map(|d| Fingerprint::from_text(d)).collect();
    let index = NearDuplicateIndex::initialize(
        store.clone(),
        &objs,
        IndexConfig::default().with_tolerance(10),
    )
    .await
    .unwrap();

    let s1 = Fingerprint::from_text(QUERY);
    assert_eq!(index.get_near_duplicates(&s1).await.unwrap().len(), 3);

    let first = objs[0];
    index.delete(&first).await.unwrap();
    index.delete(&first).await.unwrap();
    assert_eq!(index.get_near_duplicates(&s1).await.unwrap().len(), 2);

    index.add(&first).await.unwrap();
    index.add(&first).await.unwrap();
    assert_eq!(index.get_near_duplicates(&s1).await.unwrap().len(), 3);

    store.close().await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_reopen_keeps_rows() {
    let store = store("simhash_test_reopen").await;
    let x = Fingerprint::from_text("My name is John");

    NearDuplicateIndex::initialize(store.clone(), &[x], IndexConfig::default())
        .await
        .unwrap();

    let reopened = NearDuplicateIndex::open(store.clone(), IndexConfig::default())
        .await
        .unwrap();
    assert!(reopened.get_near_duplicates(&x).await.unwrap().contains(&x.value()));

    // A reset drops what the previous run stored.
    let fresh = NearDuplicateIndex::initialize(store.clone(), &[], IndexConfig::default())
        .await
        .unwrap();
    assert!(fresh.get_near_duplicates(&x).await.unwrap().is_empty());

    store.close().await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_missing_partition_is_storage_error() {
    let store = store("simhash_test_missing").await;
    store.reset(3).await.unwrap();

    let err = store.fetch(7, "0").await.unwrap_err();
    assert!(err.is_storage());

    store.close().await;
}
