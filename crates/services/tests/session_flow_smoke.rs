use std::sync::Arc;

use annotate_core::model::{Label, Task};
use annotate_core::time::fixed_now;
use services::{AnnotationLoopService, Clock};
use storage::dataset::DatasetRecord;
use storage::repository::{InMemoryRepository, ReportRepository};

fn tweet(id: u64, hs: u8) -> DatasetRecord {
    DatasetRecord {
        task: Some("hate speech".into()),
        text: format!("tweet {id}"),
        title: None,
        label: None,
        hs: Some(hs),
        target: None,
    }
}

#[tokio::test]
async fn session_flow_persists_report() {
    let repo = InMemoryRepository::new();
    let now = fixed_now();

    let records: Vec<_> = (0..3).map(|id| tweet(id, u8::from(id != 1))).collect();

    let loop_svc = AnnotationLoopService::new(Clock::fixed(now), Arc::new(repo.clone()))
        .with_sample_size(Some(3));

    let mut session = loop_svc
        .start_session(&records, Task::HateSpeech)
        .unwrap();

    // Label every sampled item as hateful, whatever the gold label says.
    while !session.is_complete() {
        let _ = loop_svc
            .submit_current(&mut session, Some(Label::Positive))
            .await
            .unwrap();
    }

    let report_id = session.report_id().expect("report persisted");
    let report = repo.get_report(report_id).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.confusion().true_positives(), 2);
    assert_eq!(report.confusion().false_positives(), 1);
    assert!((report.accuracy() - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(report.started_at(), now);
}
