//! Persistence gateway and debounced save scheduling.
//!
//! The store never awaits a save during a mutation. It hands the latest
//! snapshot to a [`SaveScheduler`], a background task that waits for a quiet
//! period and writes only the newest snapshot. Failures are logged and
//! recorded in [`PersistenceStatus`]; the next mutation schedules a retry.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Boxed future returned by gateway methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Durable storage for the serialized settings document.
pub trait PersistenceGateway: Send + Sync {
    /// Loads the stored document; `None` when nothing has been saved yet.
    fn load(&self) -> BoxFuture<'_, Result<Option<Value>>>;

    /// Stores a snapshot, replacing the previous one.
    fn save(&self, snapshot: Value) -> BoxFuture<'_, Result<()>>;
}

/// Gateway writing the document to a JSON file.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Creates a gateway for `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).context(format!(
                    "Failed to read settings file: {}",
                    self.path.display()
                ))
            }
        };
        let value = serde_json::from_str(&content).context(format!(
            "Failed to parse settings file: {}",
            self.path.display()
        ))?;
        Ok(Some(value))
    }

    async fn write(&self, snapshot: Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.context(format!(
                "Failed to create settings directory: {}",
                parent.display()
            ))?;
        }

        let content =
            serde_json::to_string_pretty(&snapshot).context("Failed to serialize settings")?;
        let temp_path = self.path.with_extension("json.tmp");

        // Write to temp file
        tokio::fs::write(&temp_path, content).await.context(format!(
            "Failed to write temp settings file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .context(format!(
                "Failed to rename temp settings file to: {}",
                self.path.display()
            ))?;

        Ok(())
    }
}

impl PersistenceGateway for FilePersistence {
    fn load(&self) -> BoxFuture<'_, Result<Option<Value>>> {
        Box::pin(self.read())
    }

    fn save(&self, snapshot: Value) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.write(snapshot))
    }
}

/// In-memory gateway that records every save.
///
/// Failures can be switched on to exercise the store's error paths.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    document: Mutex<Option<Value>>,
    saves: Mutex<Vec<Value>>,
    fail_load: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryPersistence {
    /// Empty gateway (first run).
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway pre-populated with a stored document.
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Mutex::new(Some(document)),
            ..Self::default()
        }
    }

    /// Makes subsequent loads fail.
    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent saves fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every successfully saved snapshot, oldest first.
    pub fn saved(&self) -> Vec<Value> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The currently stored document.
    pub fn document(&self) -> Option<Value> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PersistenceGateway for MemoryPersistence {
    fn load(&self) -> BoxFuture<'_, Result<Option<Value>>> {
        Box::pin(async move {
            if self.fail_load.load(Ordering::SeqCst) {
                anyhow::bail!("settings backend unavailable");
            }
            Ok(self.document())
        })
    }

    fn save(&self, snapshot: Value) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if self.fail_saves.load(Ordering::SeqCst) {
                anyhow::bail!("settings backend rejected the write");
            }
            *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
            self.saves
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(snapshot);
            Ok(())
        })
    }
}

/// Outcome of recent saves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistenceStatus {
    /// Time of the last successful save
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Error of the last failed save, cleared by the next success
    pub last_error: Option<String>,
    /// Whether a debounced save is waiting for its quiet period
    pub pending: bool,
}

enum SaveRequest {
    Schedule(Value),
    Flush {
        snapshot: Value,
        reply: oneshot::Sender<StoreResult<()>>,
    },
}

/// Handle to the background save task.
///
/// Dropping the handle closes the channel; the task writes any pending
/// snapshot and exits.
#[derive(Debug)]
pub struct SaveScheduler {
    tx: mpsc::UnboundedSender<SaveRequest>,
    status: Arc<Mutex<PersistenceStatus>>,
}

impl std::fmt::Debug for SaveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule(_) => write!(f, "Schedule"),
            Self::Flush { .. } => write!(f, "Flush"),
        }
    }
}

impl SaveScheduler {
    /// Spawns the save task on the current tokio runtime.
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(PersistenceStatus::default()));
        tokio::spawn(run_worker(gateway, debounce, rx, Arc::clone(&status)));
        Self { tx, status }
    }

    /// Queues a snapshot, replacing any snapshot still waiting.
    pub fn schedule(&self, snapshot: Value) {
        if self.tx.send(SaveRequest::Schedule(snapshot)).is_err() {
            warn!("Save task has stopped; snapshot not scheduled");
        }
    }

    /// Cancels the pending save and writes `snapshot` immediately.
    pub async fn flush(&self, snapshot: Value) -> StoreResult<()> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SaveRequest::Flush { snapshot, reply })
            .map_err(|_| StoreError::Persistence("save task has stopped".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::Persistence("save task has stopped".to_string()))?
    }

    /// Current persistence status.
    pub fn status(&self) -> PersistenceStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn run_worker(
    gateway: Arc<dyn PersistenceGateway>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<SaveRequest>,
    status: Arc<Mutex<PersistenceStatus>>,
) {
    let mut pending: Option<Value> = None;
    let mut deadline = Instant::now();

    loop {
        let request = if pending.is_some() {
            tokio::select! {
                request = rx.recv() => request,
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(snapshot) = pending.take() {
                        // Errors are recorded in the status.
                        let _ = write_snapshot(gateway.as_ref(), snapshot, &status).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match request {
            Some(SaveRequest::Schedule(snapshot)) => {
                if pending.is_some() {
                    debug!("Superseding pending save");
                }
                pending = Some(snapshot);
                deadline = Instant::now() + debounce;
                set_pending(&status, true);
            }
            Some(SaveRequest::Flush { snapshot, reply }) => {
                pending = None;
                let result = write_snapshot(gateway.as_ref(), snapshot, &status).await;
                let _ = reply.send(result);
            }
            None => {
                if let Some(snapshot) = pending.take() {
                    let _ = write_snapshot(gateway.as_ref(), snapshot, &status).await;
                }
                break;
            }
        }
    }
}

async fn write_snapshot(
    gateway: &dyn PersistenceGateway,
    snapshot: Value,
    status: &Mutex<PersistenceStatus>,
) -> StoreResult<()> {
    let result = gateway.save(snapshot).await;
    let mut status = status.lock().unwrap_or_else(PoisonError::into_inner);
    status.pending = false;
    match result {
        Ok(()) => {
            info!("Settings saved");
            status.last_saved_at = Some(Utc::now());
            status.last_error = None;
            Ok(())
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(error = %message, "Failed to save settings; will retry on next change");
            status.last_error = Some(message.clone());
            Err(StoreError::Persistence(message))
        }
    }
}

fn set_pending(status: &Mutex<PersistenceStatus>, pending: bool) {
    status.lock().unwrap_or_else(PoisonError::into_inner).pending = pending;
}
