//! Rate-window pacing under a paused clock
//!
//! These tests run the whole pipeline with `start_paused`, so the
//! governor's budget sleeps advance virtual time instantly and the
//! scripted backend's call times expose the pacing exactly.

use crate::common::backends::{Reply, ScriptedBackend};
use crate::common::fixtures::{BacklogFactory, ConfigFactory};
use catalog_forge::{CategoryRange, MemoryCatalogStore, Pipeline};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn budget_exhaustion_defers_calls_to_the_next_window() {
    // two requests per minute, five records, one worker
    let config = ConfigFactory::single_worker(
        vec![ConfigFactory::credential("throttled", 2)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    let backend = Arc::new(ScriptedBackend::always_ok());
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(5)).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported, 5);

    let times = backend.call_times();
    assert_eq!(times.len(), 5);
    let minute = Duration::from_secs(60);

    // first window: calls 1 and 2
    assert!(times[1].duration_since(times[0]) < minute);
    // second window: calls 3 and 4
    assert!(times[2].duration_since(times[0]) >= minute);
    assert!(times[3].duration_since(times[0]) < 2 * minute);
    // third window: call 5
    assert!(times[4].duration_since(times[0]) >= 2 * minute);
}

#[tokio::test(start_paused = true)]
async fn retry_attempts_reserve_their_own_budget_slots() {
    // two failed attempts drain the window, so the third waits for the
    // rollover even though it is the same record
    let mut config = ConfigFactory::single_worker(
        vec![ConfigFactory::credential("throttled", 2)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    config.pipeline.retry.max_attempts = 3;

    let backend = Arc::new(ScriptedBackend::scripted(vec![
        Reply::Transient,
        Reply::Transient,
    ]));
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(1)).await.unwrap();

    assert!(summary.success);
    assert_eq!(summary.imported, 1);
    assert!(summary.errors.is_empty());

    let times = backend.call_times();
    assert_eq!(times.len(), 3);
    assert!(times[1].duration_since(times[0]) < Duration::from_secs(60));
    assert!(times[2].duration_since(times[0]) >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn vendor_retry_hint_overrides_a_shorter_backoff() {
    // plenty of window budget, but the vendor asks for 30 seconds;
    // the 1ms backoff schedule must not undercut it
    let mut config = ConfigFactory::single_worker(
        vec![ConfigFactory::credential("hinted", 1_000)],
        vec![CategoryRange::new("grocery", 1, 100)],
    );
    config.pipeline.retry.max_attempts = 2;

    let backend = Arc::new(ScriptedBackend::scripted(vec![Reply::RateLimited(Some(
        30,
    ))]));
    let store = Arc::new(MemoryCatalogStore::new());
    let pipeline = Pipeline::new(&config, Arc::clone(&backend) as _, Arc::clone(&store) as _)
        .unwrap();

    let summary = pipeline.run(BacklogFactory::records(1)).await.unwrap();

    assert_eq!(summary.imported, 1);
    let times = backend.call_times();
    assert_eq!(times.len(), 2);
    assert!(times[1].duration_since(times[0]) >= Duration::from_secs(30));
}
