//! Async-queue backend, broker, and worker tests: late ack, retry with
//! backoff, permanent failures, lease redelivery.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use test_fixtures::{apply_schema, local_test_key_b64, sample_request, MockKms};
use vigil_core::config::{EncryptionConfig, QueueConfig};
use vigil_core::models::{EncryptionMode, SubmissionStatus};
use vigil_core::traits::SubmissionBackend;
use vigil_crypto::EncryptionGateway;
use vigil_ingest::backend::AsyncQueueBackend;
use vigil_ingest::queue::TaskState;
use vigil_ingest::{IngestWorker, SqliteBroker};
use vigil_storage::RunRepository;

fn prepared_db(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("vigil.db");
    let conn = Connection::open(&path).unwrap();
    apply_schema(&conn);
    path
}

fn local_repo() -> Arc<RunRepository> {
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Local,
        local_key_b64: Some(local_test_key_b64()),
        ..Default::default()
    };
    Arc::new(RunRepository::new(Arc::new(
        EncryptionGateway::new(&cfg, None).unwrap(),
    )))
}

fn kms_repo(kms: Arc<MockKms>) -> Arc<RunRepository> {
    let cfg = EncryptionConfig {
        mode: EncryptionMode::Kms,
        local_key_b64: None,
        ..Default::default()
    };
    Arc::new(RunRepository::new(Arc::new(
        EncryptionGateway::new(&cfg, Some(kms)).unwrap(),
    )))
}

/// Queue config with zero backoff so retries are immediately leasable.
fn fast_queue_config(max_retries: u32) -> QueueConfig {
    QueueConfig {
        max_retries,
        retry_backoff_secs: 0,
        worker_poll_interval_secs: 1,
        ..Default::default()
    }
}

// ─── Enqueue contract ───

#[test]
fn accepted_means_durably_enqueued() {
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let backend = AsyncQueueBackend::new(Arc::clone(&broker), &QueueConfig::default());

    let outcome = backend.submit(&sample_request("Acme")).unwrap();
    assert_eq!(outcome.status, SubmissionStatus::Accepted);
    assert!(outcome.run_id.is_none(), "run id is never known synchronously");
    let task_id = outcome.task_id.expect("accepted carries task id");
    assert!(outcome.eta.is_some());

    let status = backend.task_status(&task_id).unwrap().expect("task visible");
    assert_eq!(status.state, TaskState::Pending);
    assert_eq!(broker.depth().unwrap().pending, 1);
    assert!(backend.health_check());
}

#[test]
fn validation_failures_are_never_enqueued() {
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let backend = AsyncQueueBackend::new(Arc::clone(&broker), &QueueConfig::default());

    let mut req = sample_request("Acme");
    req.target_info.db_type = String::new();

    let outcome = backend.submit(&req).unwrap();
    assert_eq!(outcome.status, SubmissionStatus::Rejected);

    let depth = broker.depth().unwrap();
    assert_eq!(depth.pending + depth.running + depth.done + depth.failed, 0);
}

// ─── Worker happy path ───

#[test]
fn worker_stores_the_run_and_acks_late() {
    let dir = TempDir::new().unwrap();
    let db_path = prepared_db(&dir);
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let backend = AsyncQueueBackend::new(Arc::clone(&broker), &QueueConfig::default());
    let worker = IngestWorker::new(
        Arc::clone(&broker),
        local_repo(),
        db_path.clone(),
        &fast_queue_config(3),
    );

    let task_id = backend
        .submit(&sample_request("Acme"))
        .unwrap()
        .task_id
        .unwrap();

    assert!(worker.run_once().unwrap(), "one task should be leased");
    assert!(!worker.run_once().unwrap(), "queue should be drained");

    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Done);

    let conn = Connection::open(&db_path).unwrap();
    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM health_check_runs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(runs, 1);
}

// ─── Retry semantics ───

#[test]
fn transient_failures_are_retried_then_succeed() {
    let dir = TempDir::new().unwrap();
    let db_path = prepared_db(&dir);
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let kms = Arc::new(MockKms::new());
    let worker = IngestWorker::new(
        Arc::clone(&broker),
        kms_repo(Arc::clone(&kms)),
        db_path.clone(),
        &fast_queue_config(3),
    );

    let task_id = broker.enqueue(&sample_request("Acme")).unwrap();

    kms.set_fail_generate(true);
    assert!(worker.run_once().unwrap());

    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Pending, "scheduled for retry");
    assert_eq!(status.attempts, 1);
    assert!(status.last_error.unwrap().contains("KMS"));

    // Each retry is a fresh transaction: the failed attempt left nothing.
    let conn = Connection::open(&db_path).unwrap();
    let companies: i64 = conn
        .query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))
        .unwrap();
    assert_eq!(companies, 0);

    kms.set_fail_generate(false);
    assert!(worker.run_once().unwrap());
    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Done);

    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM health_check_runs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(runs, 1);
}

#[test]
fn retries_exhaust_into_a_visible_failure() {
    let dir = TempDir::new().unwrap();
    let db_path = prepared_db(&dir);
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let kms = Arc::new(MockKms::new());
    kms.set_fail_generate(true);
    let worker = IngestWorker::new(
        Arc::clone(&broker),
        kms_repo(kms),
        db_path.clone(),
        &fast_queue_config(2),
    );

    let task_id = broker.enqueue(&sample_request("Acme")).unwrap();

    // Initial attempt + 2 retries, then the task is reported failed.
    for _ in 0..3 {
        assert!(worker.run_once().unwrap());
    }
    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(status.attempts, 2);
    assert!(status.last_error.is_some(), "failure is not silent");

    // No partial rows from any attempt.
    let conn = Connection::open(&db_path).unwrap();
    let runs: i64 = conn
        .query_row("SELECT COUNT(*) FROM health_check_runs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(runs, 0);
}

#[test]
fn permanent_errors_fail_without_retry() {
    // Main database has no schema: SchemaMismatch, not worth retrying.
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("no-schema.db");
    let broker = Arc::new(SqliteBroker::open_in_memory(300).unwrap());
    let worker = IngestWorker::new(
        Arc::clone(&broker),
        local_repo(),
        db_path,
        &fast_queue_config(5),
    );

    let task_id = broker.enqueue(&sample_request("Acme")).unwrap();
    assert!(worker.run_once().unwrap());

    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Failed);
    assert_eq!(status.attempts, 0, "permanent errors burn no retries");
}

// ─── Broker mechanics ───

#[test]
fn backoff_delays_the_next_attempt() {
    let broker = SqliteBroker::open_in_memory(300).unwrap();
    let task_id = broker.enqueue(&sample_request("Acme")).unwrap();

    let leased = broker.lease_next(Utc::now()).unwrap().unwrap();
    assert_eq!(leased.task_id, task_id);

    let attempts = broker.retry(&task_id, 60, "connection refused").unwrap();
    assert_eq!(attempts, 1);

    // Not ready now, ready after the delay elapses.
    assert!(broker.lease_next(Utc::now()).unwrap().is_none());
    let later = Utc::now() + Duration::seconds(90);
    assert!(broker.lease_next(later).unwrap().is_some());
}

#[test]
fn expired_leases_are_redelivered() {
    let broker = SqliteBroker::open_in_memory(1).unwrap();
    let task_id = broker.enqueue(&sample_request("Acme")).unwrap();

    // Worker leases, then dies without acking.
    assert!(broker.lease_next(Utc::now()).unwrap().is_some());
    assert_eq!(broker.depth().unwrap().running, 1);

    let after_lease = Utc::now() + Duration::seconds(5);
    assert_eq!(broker.recover_expired(after_lease).unwrap(), 1);

    let status = broker.task_status(&task_id).unwrap().unwrap();
    assert_eq!(status.state, TaskState::Pending);
    assert!(broker.lease_next(after_lease).unwrap().is_some());
}

#[test]
fn tasks_are_leased_oldest_first() {
    let broker = SqliteBroker::open_in_memory(300).unwrap();
    let first = broker.enqueue(&sample_request("Acme")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let _second = broker.enqueue(&sample_request("Globex")).unwrap();

    let leased = broker.lease_next(Utc::now()).unwrap().unwrap();
    assert_eq!(leased.task_id, first);
}
