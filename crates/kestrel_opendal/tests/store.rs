use kestrel_core::constants::keys;
use kestrel_core::prelude::*;
use kestrel_opendal::OpendalJobStore;
use opendal::{
    Operator,
    services::{Fs, Memory},
};
use std::sync::Arc;

fn memory_store(clock: &ManualClock) -> OpendalJobStore {
    let op = Operator::new(Memory::default()).unwrap().finish();
    OpendalJobStore::new(op).with_clock(Arc::new(clock.clone()))
}

fn scenario_form() -> TrainingJobForm {
    let form = TrainingJobForm::new().set_field(FormField::JobName("train-abc123".into()));
    let train = form.input_data_config[0].id.clone();
    form.update_channel(
        &train,
        ChannelPatch {
            provider: Some(StorageProvider::Minio),
            bucket: Some("b".into()),
            prefix: Some("p".into()),
            ..Default::default()
        },
    )
    .set_field(FormField::OutputDataConfig(OutputDataConfig {
        artifact_uri: "storage://out/".into(),
    }))
}

#[tokio::test]
async fn submit_then_list_then_advance() {
    let clock = ManualClock::new(1_000);
    let store = memory_store(&clock);

    let form = scenario_form();
    assert!(validate(&form).is_empty());

    let job = StoredJob::for_submission(&form, clock.now_ms(), &SimulatedDelay::default());
    let filename = store.persist(&to_payload(&form), &job).await.unwrap();
    assert!(filename.contains("train-abc123"));

    let raw = store
        .operator()
        .read(&format!("{}{filename}", keys::PAYLOAD_PREFIX))
        .await
        .unwrap();
    let payload: JobPayload = serde_json::from_slice(&raw.to_vec()).unwrap();
    assert_eq!(payload, to_payload(&form));

    let jobs = store.list().await.unwrap();
    assert_eq!(jobs[0].id, "train-abc123");
    assert_eq!(jobs[0].status, JobStatus::Pending);

    clock.advance(15_000);
    let jobs = store.list().await.unwrap();
    assert_eq!(jobs[0].status, JobStatus::Running);
    assert_eq!(jobs[0].pending_until, None);

    let raw = store.operator().read(keys::INDEX).await.unwrap();
    assert_eq!(parse_index(&raw.to_vec())[0].status, JobStatus::Running);
}

#[tokio::test]
async fn garbage_index_reads_as_empty() {
    let store = memory_store(&ManualClock::new(0));
    store
        .operator()
        .write(keys::INDEX, b"{not json".to_vec())
        .await
        .unwrap();
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_removes_index_and_payloads() {
    let clock = ManualClock::new(0);
    let store = memory_store(&clock);
    store.clear().await.unwrap();

    let form = scenario_form();
    for offset in 0..3 {
        clock.advance(offset);
        let job = StoredJob::for_submission(&form, clock.now_ms(), &SimulatedDelay::default());
        store.persist(&to_payload(&form), &job).await.unwrap();
    }
    store
        .operator()
        .write("unrelated/key", b"keep".to_vec())
        .await
        .unwrap();

    store.clear().await.unwrap();
    assert!(store.list().await.unwrap().is_empty());

    let left = store
        .operator()
        .list_with(keys::PAYLOAD_PREFIX)
        .recursive(true)
        .await
        .unwrap_or_default();
    assert!(left.iter().all(|entry| entry.metadata().is_dir()));
    assert!(store.operator().exists("unrelated/key").await.unwrap());
}

#[tokio::test]
async fn failed_payload_write_leaves_index_untouched() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("training-job-ui")).unwrap();
    // A plain file where the payload directory should be.
    std::fs::write(dir.path().join("training-job-ui/payloads"), b"").unwrap();

    let root = dir.path().to_string_lossy().to_string();
    let op = Operator::new(Fs::default().root(&root)).unwrap().finish();
    let store = OpendalJobStore::new(op).with_clock(Arc::new(ManualClock::new(0)));

    let form = scenario_form();
    let job = StoredJob::for_submission(&form, 0, &SimulatedDelay::default());
    assert!(store.persist(&to_payload(&form), &job).await.is_err());

    assert!(store.list().await.unwrap().is_empty());
    assert!(!store.operator().exists(keys::INDEX).await.unwrap());
}
