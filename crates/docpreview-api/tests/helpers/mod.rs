//! Test helpers: fake external tools, a recording failure sink and an app
//! wired to local storage in a temp dir.
//!
//! Run from workspace root: `cargo test -p docpreview-api`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use docpreview_api::setup::routes;
use docpreview_api::{AppState, JobExecutor, JobQueue};
use docpreview_core::{Config, JobRequest, StorageBackend};
use docpreview_infra::{FailureReport, FailureSink};
use docpreview_processing::{CommandOutput, CommandRunner, DocumentConverter, ProcessError};
use docpreview_storage::LocalStorage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

pub const TEST_BUCKET: &str = "test-bucket";
pub const TEST_KEY: &str = "foo/bar/baz.pptx";
pub const PREVIEW_KEY: &str = "foo/bar/baz-preview.pdf";

/// Bytes the fake renderer writes as the "rendered" PDF
pub const RENDERED_PDF: &[u8] = b"%PDF-1.4 fake preview\n";
pub const RENDERED_PDF_MD5: &str = "46861b599e249e67d9fe5e8cb19790c7";

pub const PDFINFO_OUTPUT: &str = "Producer:       LibreOffice 7.3\nPages:          1\nPage size:      842 x 595 pts\n";

/// Fake `lowriter` + `pdfinfo`
///
/// The renderer writes `RENDERED_PDF` where the real one would. When a gate
/// is set, the renderer signals `started` and then waits for a gate permit.
#[derive(Default)]
pub struct FakeCommandRunner {
    pub calls: Mutex<Vec<String>>,
    pub fail_conversion: bool,
    pub skip_output: bool,
    /// `pdfinfo` prints no page-size line
    pub unreadable_pdf: bool,
    pub gate: Option<Arc<Semaphore>>,
    pub started: Arc<Notify>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_conversion: true,
            ..Self::default()
        }
    }

    /// Renderer blocks until `gate` has a permit
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(program.to_string());

        match program {
            "lowriter" => {
                if let Some(gate) = &self.gate {
                    self.started.notify_one();
                    let _permit = gate.acquire().await;
                }
                if self.fail_conversion {
                    return Ok(CommandOutput {
                        code: Some(1),
                        stdout: Vec::new(),
                        stderr: b"Error: source file could not be loaded".to_vec(),
                    });
                }
                if !self.skip_output {
                    let out_dir = Path::new(&args[4]);
                    let source = Path::new(&args[5]);
                    std::fs::write(DocumentConverter::output_path(source, out_dir), RENDERED_PDF)?;
                }
                Ok(CommandOutput {
                    code: Some(0),
                    ..Default::default()
                })
            }
            "pdfinfo" if self.unreadable_pdf => Ok(CommandOutput {
                code: Some(0),
                stdout: b"Producer:       LibreOffice 7.3\nPages:          0\n".to_vec(),
                stderr: Vec::new(),
            }),
            "pdfinfo" => Ok(CommandOutput {
                code: Some(0),
                stdout: PDFINFO_OUTPUT.as_bytes().to_vec(),
                stderr: Vec::new(),
            }),
            other => panic!("unexpected program {}", other),
        }
    }
}

/// Keeps every report for assertions
#[derive(Default)]
pub struct RecordingFailureSink {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingFailureSink {
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<String> {
        self.reports().into_iter().map(|r| r.stage).collect()
    }
}

impl FailureSink for RecordingFailureSink {
    fn notify(&self, report: &FailureReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/// Everything a pipeline test needs, rooted in one temp dir
pub struct TestEnv {
    pub config: Config,
    pub storage: Arc<LocalStorage>,
    pub runner: Arc<FakeCommandRunner>,
    pub failures: Arc<RecordingFailureSink>,
    pub _temp_dir: TempDir,
}

impl TestEnv {
    pub async fn new(runner: FakeCommandRunner) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store_path = temp_dir.path().join("store");
        let work_dir = temp_dir.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();

        let config = Config {
            storage_backend: StorageBackend::Local,
            local_storage_path: Some(store_path.to_string_lossy().into_owned()),
            work_dir,
            callback_timeout_secs: 5,
            ..Config::default()
        };

        let storage = Arc::new(LocalStorage::new(store_path).await.unwrap());

        Self {
            config,
            storage,
            runner: Arc::new(runner),
            failures: Arc::new(RecordingFailureSink::default()),
            _temp_dir: temp_dir,
        }
    }

    pub fn executor(&self) -> JobExecutor {
        JobExecutor::new(
            &self.config,
            self.storage.clone(),
            self.runner.clone(),
            self.failures.clone(),
        )
        .unwrap()
    }

    pub fn job_queue(&self, max_concurrent: usize, queue_size: usize) -> Arc<JobQueue> {
        Arc::new(JobQueue::new(
            Arc::new(self.executor()),
            max_concurrent,
            queue_size,
        ))
    }

    pub fn state(&self, job_queue: Arc<JobQueue>) -> Arc<AppState> {
        Arc::new(AppState { job_queue })
    }

    pub fn server(&self, state: Arc<AppState>) -> TestServer {
        TestServer::new(routes::setup_routes(state)).unwrap()
    }

    /// Place a source object in the local store
    pub fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) {
        let path = self.object_path(bucket, key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.storage.object_path(bucket, key).unwrap()
    }

    /// Entries left in WORK_DIR
    pub fn work_dir_entries(&self) -> usize {
        std::fs::read_dir(&self.config.work_dir).unwrap().count()
    }
}

pub fn job_request(callback_url: String) -> JobRequest {
    JobRequest {
        bucket: TEST_BUCKET.to_string(),
        key: TEST_KEY.to_string(),
        callback_url,
        callback_method: None,
    }
}

pub fn expected_callback_body() -> String {
    format!(
        r#"{{"status":"completed","thumbnails":{{"preview":{{"content_hash":"{}","content_type":"application/pdf","content_size":{},"width":842,"height":595}}}}}}"#,
        RENDERED_PDF_MD5,
        RENDERED_PDF.len()
    )
}

/// Poll until `check` holds or the timeout elapses
pub async fn wait_for<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..250 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met within 5s");
}
