use chrono::Duration;
use annotate_core::model::{Label, SessionReport, Task};
use annotate_core::time::fixed_now;
use storage::repository::ReportRepository;
use storage::sqlite::SqliteRepository;

fn build_report(task: Task, completed_offset_days: i64) -> SessionReport {
    let now = fixed_now();
    SessionReport::from_decisions(
        task,
        now,
        now + Duration::days(completed_offset_days),
        &[
            (Label::Positive, Label::Positive),
            (Label::Negative, Label::Positive),
            (Label::Positive, Label::Negative),
            (Label::Negative, Label::Negative),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_confusion_counts() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let report = build_report(Task::FakeNews, 0);
    let id = repo.append_report(&report).await.unwrap();

    let fetched = repo.get_report(id).await.unwrap();
    assert_eq!(fetched, report);
    assert_eq!(fetched.confusion().true_positives(), 1);
    assert_eq!(fetched.total(), 4);
    assert_eq!(fetched.accuracy(), 0.5);
}

#[tokio::test]
async fn sqlite_missing_report_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let err = repo.get_report(99).await.unwrap_err();
    assert!(matches!(err, storage::repository::StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_list_filters_and_orders() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_list?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let old_news = build_report(Task::FakeNews, 1);
    let new_news = build_report(Task::FakeNews, 3);
    let tweets = build_report(Task::HateSpeech, 2);
    repo.append_report(&old_news).await.unwrap();
    repo.append_report(&new_news).await.unwrap();
    repo.append_report(&tweets).await.unwrap();

    let all = repo.list_reports(None, None, None, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].report.completed_at(), new_news.completed_at());

    let news_only = repo
        .list_reports(Some(Task::FakeNews), None, None, 10)
        .await
        .unwrap();
    assert_eq!(news_only.len(), 2);
    assert!(news_only.iter().all(|r| r.report.task() == Task::FakeNews));

    let windowed = repo
        .list_reports(
            None,
            Some(fixed_now() + Duration::days(2)),
            Some(fixed_now() + Duration::days(2)),
            10,
        )
        .await
        .unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].report.task(), Task::HateSpeech);

    let limited = repo.list_reports(None, None, None, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let id = repo
        .append_report(&build_report(Task::HateSpeech, 0))
        .await
        .unwrap();
    assert!(id > 0);
}
