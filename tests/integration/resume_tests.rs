//! Resume behavior against a seeded store

use crate::common::backends::ScriptedBackend;
use crate::common::fixtures::{BacklogFactory, CatalogRecordFactory, ConfigFactory};
use catalog_forge::{CatalogStore, CategoryRange, MemoryCatalogStore, Pipeline};
use std::sync::Arc;

fn two_band_taxonomy() -> Vec<CategoryRange> {
    vec![
        CategoryRange::new("early", 1, 3),
        CategoryRange::new("late", 4, 10),
    ]
}

#[tokio::test]
async fn rerun_continues_after_the_last_persisted_record() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .insert(CatalogRecordFactory::persisted("Product 3"))
        .await
        .unwrap();

    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        two_band_taxonomy(),
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(6)).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported, 3);
    assert_eq!(backend.call_count(), 3);
    assert_eq!(store.count().await.unwrap(), 4);

    // sheet ordinals survive the skip: records 4..=6 classify as "late"
    for record in store.records().await {
        if record.display_name == "Product 3" {
            continue;
        }
        assert!(
            matches!(record.display_name.as_str(), "Product 4" | "Product 5" | "Product 6"),
            "unexpected record {}",
            record.display_name
        );
        assert_eq!(record.resolved_category_id, "late");
    }
}

#[tokio::test]
async fn fully_covered_backlog_is_a_no_op() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .insert(CatalogRecordFactory::persisted("Product 6"))
        .await
        .unwrap();

    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        two_band_taxonomy(),
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(6)).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported, 0);
    assert!(summary.errors.is_empty());
    assert_eq!(backend.call_count(), 0);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn disabling_resume_reprocesses_the_whole_sheet() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .insert(CatalogRecordFactory::persisted("Product 3"))
        .await
        .unwrap();

    let mut config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        two_band_taxonomy(),
    );
    config.pipeline.resume = false;

    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(6)).await.unwrap();

    assert_eq!(summary.imported, 6);
    assert_eq!(backend.call_count(), 6);
    // the seeded record stays alongside the six fresh ones
    assert_eq!(store.count().await.unwrap(), 7);
}

#[tokio::test]
async fn unknown_last_record_restarts_from_the_top() {
    let store = Arc::new(MemoryCatalogStore::new());
    store
        .insert(CatalogRecordFactory::persisted("Discontinued widget"))
        .await
        .unwrap();

    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        two_band_taxonomy(),
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(4)).await.unwrap();

    assert_eq!(summary.imported, 4);
    assert_eq!(store.count().await.unwrap(), 5);
}
