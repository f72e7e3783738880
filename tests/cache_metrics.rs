use std::collections::HashMap;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use quire::application::posts::PostService;
use quire::cache::{
    CacheConfig, METRIC_CACHE_ENTRIES, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
    METRIC_CACHE_MISS, METRIC_SORT_MS,
};
use quire::domain::entities::PostRecord;
use quire::domain::posts::PostEdit;
use quire::domain::sort::PostSortKey;
use quire::infra::memory::InMemoryRepositories;
use quire::infra::telemetry;
use time::OffsetDateTime;

fn sample_post(id: i64, views: u64) -> PostRecord {
    PostRecord {
        id,
        owner_id: 1,
        title: format!("Metrics Test Post {id}"),
        content: String::new(),
        created_at: Some(OffsetDateTime::now_utc()),
        updated_at: None,
        view_count: views,
        author_name: None,
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let repo = Arc::new(InMemoryRepositories::new());
    repo.insert_post(sample_post(1, 3));
    repo.insert_post(sample_post(2, 8));
    let service = PostService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        &CacheConfig::default(),
    );

    // miss, hit, miss
    service.get_post(1).await.expect("load");
    service.get_post(1).await.expect("load");
    service.get_post(2).await.expect("load");

    let edit = PostEdit::new(2, "renamed", "").expect("edit");
    assert!(service.update_post(&edit).await.expect("update"));

    service
        .get_sorted_posts(10, PostSortKey::Views)
        .await
        .expect("sorted");

    let values: HashMap<String, DebugValue> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, value)| (composite_key.key().name().to_string(), value))
        .collect();

    for metric in [
        METRIC_CACHE_HIT,
        METRIC_CACHE_MISS,
        METRIC_CACHE_INVALIDATE,
        METRIC_CACHE_ENTRIES,
        METRIC_SORT_MS,
    ] {
        assert!(values.contains_key(metric), "missing metric: {metric}");
    }

    assert!(matches!(values.get(METRIC_CACHE_HIT), Some(DebugValue::Counter(1))));
    assert!(matches!(values.get(METRIC_CACHE_MISS), Some(DebugValue::Counter(2))));
    assert!(matches!(
        values.get(METRIC_CACHE_INVALIDATE),
        Some(DebugValue::Counter(1))
    ));
}
