#![allow(dead_code)]

use async_trait::async_trait;
use datagate_core::{
    DocumentRepository, Entity, MemoryDocumentStore, Predicate, RepoError, RepoResult,
    Repository, SqliteContext, SqliteRepository, SERVICE_LOG_TARGET,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Once};
use std::thread::{self, ThreadId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub value: i64,
    #[serde(default)]
    pub label: Option<String>,
}

impl Widget {
    pub fn new(id: &str, value: i64) -> Self {
        Self {
            id: id.to_string(),
            value,
            label: None,
        }
    }
}

impl Entity for Widget {
    type Id = String;
    const COLLECTION: &'static str = "widgets";

    fn id(&self) -> String {
        self.id.clone()
    }
}

pub fn sqlite_repo() -> SqliteRepository<Widget> {
    let context = SqliteContext::open_in_memory().unwrap();
    SqliteRepository::sqlite(&context).unwrap()
}

pub fn document_repo() -> DocumentRepository<Widget> {
    DocumentRepository::document(&MemoryDocumentStore::new()).unwrap()
}

/// One fresh, empty repository per backend.
pub fn all_backends() -> Vec<(&'static str, Arc<dyn Repository<Widget>>)> {
    vec![
        ("sqlite", Arc::new(sqlite_repo()) as Arc<dyn Repository<Widget>>),
        ("document", Arc::new(document_repo()) as Arc<dyn Repository<Widget>>),
    ]
}

pub fn sorted_ids(widgets: &[Widget]) -> Vec<String> {
    let mut ids: Vec<_> = widgets.iter().map(|widget| widget.id.clone()).collect();
    ids.sort();
    ids
}

/// Repository whose every call fails with `RepoError::Poisoned`.
pub struct FailingRepository;

#[async_trait]
impl Repository<Widget> for FailingRepository {
    async fn get_by_id(&self, _id: &String) -> RepoResult<Option<Widget>> {
        Err(RepoError::Poisoned)
    }

    async fn get_all(&self) -> RepoResult<Vec<Widget>> {
        Err(RepoError::Poisoned)
    }

    async fn find(&self, _predicate: &Predicate<Widget>) -> RepoResult<Vec<Widget>> {
        Err(RepoError::Poisoned)
    }

    async fn query_single(&self, _predicate: &Predicate<Widget>) -> RepoResult<Option<Widget>> {
        Err(RepoError::Poisoned)
    }

    async fn add(&self, _entity: &Widget) -> RepoResult<()> {
        Err(RepoError::Poisoned)
    }

    async fn update(&self, _entity: &Widget) -> RepoResult<()> {
        Err(RepoError::Poisoned)
    }

    async fn remove(&self, _id: &String) -> RepoResult<()> {
        Err(RepoError::Poisoned)
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, CapturedRecord)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let captured = CapturedRecord {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        self.records
            .lock()
            .unwrap()
            .push((thread::current().id(), captured));
    }

    fn flush(&self) {}
}

static LOGGER: Lazy<CaptureLogger> = Lazy::new(|| CaptureLogger {
    records: Mutex::new(Vec::new()),
});
static INSTALL: Once = Once::new();

/// Installs the capturing logger for this test binary.
pub fn install_log_capture() {
    INSTALL.call_once(|| {
        log::set_logger(&*LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Service failure records emitted on the calling thread.
///
/// `#[tokio::test]` drives the test body on the test thread, so this isolates
/// records from tests running in parallel.
pub fn service_errors() -> Vec<CapturedRecord> {
    let current = thread::current().id();
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread_id, record)| {
            *thread_id == current
                && record.level == Level::Error
                && record.target == SERVICE_LOG_TARGET
        })
        .map(|(_, record)| record.clone())
        .collect()
}
