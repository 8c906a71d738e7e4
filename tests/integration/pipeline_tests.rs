//! End-to-end pipeline runs over in-memory storage

use crate::common::backends::{Reply, Route, RoutedBackend, ScriptedBackend, VALID_FIELDS_JSON};
use crate::common::fixtures::{BacklogFactory, ConfigFactory};
use catalog_forge::{
    CatalogStore, CategoryRange, MemoryCatalogStore, Pipeline, PipelineError, WorkerStatus,
};
use std::sync::Arc;

#[tokio::test]
async fn whole_backlog_is_enriched_and_persisted() {
    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(5)).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported, 5);
    assert!(summary.errors.is_empty());
    assert_eq!(store.count().await.unwrap(), 5);
    assert_eq!(backend.call_count(), 5);

    let mut names: Vec<String> = store
        .records()
        .await
        .iter()
        .map(|r| r.display_name.clone())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["Product 1", "Product 2", "Product 3", "Product 4", "Product 5"]
    );
    for record in store.records().await {
        assert_eq!(record.resolved_category_id, "grocery");
        assert_eq!(record.translated_name, "Imported product");
    }
}

#[tokio::test]
async fn condemned_records_do_not_stop_the_run() {
    // one worker so the script lines up with record order
    let config = ConfigFactory::single_worker(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    let backend = Arc::new(ScriptedBackend::scripted(vec![
        Reply::Text(VALID_FIELDS_JSON),
        Reply::Transient,
        Reply::Text(VALID_FIELDS_JSON),
        Reply::Text("The answer is: it depends."),
        Reply::Text(VALID_FIELDS_JSON),
        Reply::Text(VALID_FIELDS_JSON),
    ]));
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let backlog = BacklogFactory::records(6);
    let total = backlog.len() as u64;
    let summary = pipeline.run(backlog).await.unwrap();

    // record failures condemn records, never the run
    assert!(summary.success);
    assert_eq!(summary.imported, 4);
    assert_eq!(summary.errors.len(), 2);
    assert_eq!(summary.imported + summary.errors.len() as u64, total);
    assert!(summary.errors[0].contains("Product 2"));
    assert!(summary.errors[1].contains("Product 4"));
    assert_eq!(store.count().await.unwrap(), 4);
}

#[tokio::test]
async fn circuit_breaker_cancels_a_doomed_run() {
    let mut config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    config.pipeline.workers.min = 4;
    config.pipeline.workers.max = 4;
    // abort each worker on its first failure
    config.pipeline.consecutive_failure_limit = 0;

    let backend = Arc::new(ScriptedBackend::always_failing());
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(12)).await.unwrap();

    assert!(!summary.success);
    assert_eq!(summary.imported, 0);
    assert_eq!(store.count().await.unwrap(), 0);
    assert!(
        summary
            .errors
            .iter()
            .any(|message| message.contains("Circuit breaker tripped")),
        "expected a breaker notice in {:?}",
        summary.errors
    );
    // four condemned records, four abort notices, one breaker notice
    assert_eq!(summary.errors.len(), 9);

    let snapshot = pipeline.registry().snapshot();
    assert_eq!(snapshot.len(), 4);
    assert!(snapshot.iter().all(|s| s.status == WorkerStatus::Failed));
}

#[tokio::test(start_paused = true)]
async fn breaker_trip_keeps_records_imported_before_it() {
    let mut config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    config.pipeline.workers.min = 2;
    config.pipeline.workers.max = 2;
    config.pipeline.consecutive_failure_limit = 0;

    // Product 1 is persisted before the poisoned Product 2 kills its
    // worker; Product 3 is still in flight when the trip cancels the run
    let backend = Arc::new(RoutedBackend::new(
        vec![
            ("Product 1", Route::ok_after(1)),
            ("Product 2", Route::failing_after(5)),
            ("Product 3", Route::ok_after(120)),
        ],
        Route::ok(),
    ));
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, backend as _, Arc::clone(&store) as _).unwrap();

    let summary = pipeline.run(BacklogFactory::records(4)).await.unwrap();

    assert!(!summary.success);
    assert!(
        summary
            .errors
            .iter()
            .any(|message| message.contains("Circuit breaker tripped")),
        "expected a breaker notice in {:?}",
        summary.errors
    );
    // one condemned record, one abort notice, one breaker notice
    assert_eq!(summary.errors.len(), 3);

    // the pre-trip import survives in the summary and the store
    assert_eq!(summary.imported, 1);
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.records().await[0].display_name, "Product 1");

    // one worker died on the poisoned record, the other was cancelled
    // mid-record and left its record unreported
    let snapshot = pipeline.registry().snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().any(|s| s.status == WorkerStatus::Failed));
    assert!(snapshot.iter().any(|s| s.status == WorkerStatus::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn stalled_workers_time_out_and_fail_the_run() {
    let mut config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    config.pipeline.workers.min = 2;
    config.pipeline.workers.max = 2;
    config.pipeline.worker_timeout_secs = 5;

    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(
        &config,
        Arc::new(RoutedBackend::stalling()) as _,
        Arc::clone(&store) as _,
    )
    .unwrap();

    let summary = pipeline.run(BacklogFactory::records(4)).await.unwrap();

    assert!(!summary.success);
    assert_eq!(summary.imported, 0);
    assert_eq!(store.count().await.unwrap(), 0);
    let timeouts = summary
        .errors
        .iter()
        .filter(|message| message.contains("timed out after 5s"))
        .count();
    assert_eq!(
        timeouts, 2,
        "expected both workers to time out: {:?}",
        summary.errors
    );
    // the timed-out loops count as failures and trip the breaker
    assert!(
        summary
            .errors
            .iter()
            .any(|message| message.contains("Circuit breaker tripped"))
    );

    let snapshot = pipeline.registry().snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|s| s.status == WorkerStatus::Failed));
}

#[tokio::test]
async fn worker_count_never_exceeds_the_backlog() {
    // budget would allow 20 workers, but there are only 2 records
    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(2)).await.unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(pipeline.registry().snapshot().len(), 2);
}

#[tokio::test]
async fn narrower_category_ranges_win_overlaps() {
    // ordinals 1..=10 are grocery, but 3..=4 is the narrower specialty range
    let config = ConfigFactory::single_worker(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![
            CategoryRange::new("grocery", 1, 10),
            CategoryRange::new("specialty", 3, 4),
        ],
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    pipeline.run(BacklogFactory::records(5)).await.unwrap();

    for record in store.records().await {
        let expected = match record.display_name.as_str() {
            "Product 3" | "Product 4" => "specialty",
            _ => "grocery",
        };
        assert_eq!(
            record.resolved_category_id, expected,
            "wrong category for {}",
            record.display_name
        );
    }
}

#[tokio::test]
async fn empty_backlog_is_rejected() {
    let config = ConfigFactory::config(
        vec![ConfigFactory::credential("main", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    let pipeline = Pipeline::new(
        &config,
        Arc::new(ScriptedBackend::always_ok()) as _,
        Arc::new(MemoryCatalogStore::new()) as _,
    )
    .unwrap();

    let err = pipeline.run(Vec::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyBacklog));
}
