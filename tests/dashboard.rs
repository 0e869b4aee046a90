use chrono::Utc;
use pretty_assertions::assert_eq;
use sirc_dashboard::models::{FileStatus, FileType, HitType};
use sirc_dashboard::repository::{CrossingRun, Filter, NewUpload, QueryFilter};
use sirc_dashboard::retry::{BlockReason, ManualClock, RetryOutcome};
use sirc_dashboard::{DashboardError, DashboardStore, DataSource, RetryConfig, RetryController};
use std::time::Duration;

async fn seeded() -> DashboardStore {
    let store = DashboardStore::new(DataSource::Seed);
    store
        .refresh_with_retry(&RetryController::new(RetryConfig::default()))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn upload_then_cross_then_search() {
    let store = seeded().await;

    let id = {
        let mut repos = store.write();
        let file = repos
            .files
            .upload(NewUpload {
                name: "obitos_fevereiro_2025.csv".into(),
                size_bytes: 2 * 1024 * 1024,
                file_type: FileType::Mensal,
                reference: "02/2025".into(),
                user: "operador".into(),
            })
            .unwrap();
        assert_eq!(file.status, FileStatus::Salvo);
        file.id.clone()
    };

    let crossing = store
        .write()
        .run_crossing(
            &id,
            CrossingRun {
                total_deaths: 400,
                total_hits: 300,
                execution_time: 95,
                crossing_date: Utc::now(),
            },
        )
        .unwrap();
    assert_eq!(crossing.hit_percentage, 75.0);
    assert_eq!(crossing.reference, "02/2025");

    let repos = store.read();
    assert_eq!(repos.files.len(), 21);
    assert_eq!(repos.crossings.summary().total_crossings, 16);
    assert!(repos.files.get(&id).unwrap().last_crossing.is_some());
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_configured_limit() {
    let store = DashboardStore::new(DataSource::Seed)
        .with_upload_limits(1, vec!["csv".to_string()]);
    store.refresh().await.unwrap();

    let err = store
        .write()
        .files
        .upload(NewUpload {
            name: "obitos.csv".into(),
            size_bytes: 2 * 1024 * 1024,
            file_type: FileType::Mensal,
            reference: "02/2025".into(),
            user: "operador".into(),
        })
        .unwrap_err();
    assert!(matches!(err, DashboardError::Validation(m) if m.contains("1MB")));
    assert_eq!(store.read().files.len(), 20);
}

#[tokio::test]
async fn search_pages_and_exports() {
    let store = seeded().await;
    let repos = store.read();

    let mut filter = QueryFilter::default();
    filter.apply(|f| f.hit_types = vec![HitType::Perfeito]);
    assert!(filter.has_active_filters());

    let page = repos.results.query(&filter).unwrap();
    assert!(page.items.iter().all(|r| r.hit_types.contains(&HitType::Perfeito)));
    assert_eq!(page.pagination.page, 1);

    let csv = repos.results.export_csv(&filter).unwrap();
    assert_eq!(csv.lines().count(), page.pagination.total + 1);

    filter.reset();
    filter.include_no_hits = true;
    let stats = repos.results.statistics(&filter).unwrap();
    assert_eq!(stats.total, 30);
    assert_eq!(stats.with_hits + stats.without_hits, 30);
}

#[tokio::test]
async fn retry_controller_blocks_until_cooldown_elapses() {
    let clock = ManualClock::new(1_000);
    let controller = RetryController::with_clock(
        RetryConfig::new(3).with_retry_delay(Duration::from_millis(100)),
        clock.clone(),
    );

    let failed = controller
        .try_execute(|| async { Err::<(), _>("offline") })
        .await;
    assert_eq!(failed, RetryOutcome::Failed);

    let blocked = controller.try_execute(|| async { Ok::<(), String>(()) }).await;
    assert_eq!(
        blocked,
        RetryOutcome::Blocked(BlockReason::CoolingDown {
            remaining: Duration::from_millis(100)
        })
    );

    clock.advance(Duration::from_millis(100));
    assert!(controller.execute_retry(|| async { Ok::<(), String>(()) }).await);
    assert_eq!(controller.state().retry_count, 0);
}
