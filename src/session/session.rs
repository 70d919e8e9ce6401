use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StateMutex};
use std::thread::available_parallelism;

use compio::dispatcher::{Dispatcher, DispatcherBuilder};
use futures::lock::Mutex as ScanMutex;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use crate::registry::ProjectRegistry;
use crate::scanner::{ScanError, ScanOptions, scan_project};
use crate::tree::ScanResult;

/// Default number of scan workers when system parallelism cannot be determined
const DEFAULT_WORKER_THREADS: usize = 1;

/// Per-project tree cache.
///
/// Physical walks run on a background dispatcher; per-project async locks
/// guarantee that at most one walk per project is in flight, and a caller
/// that waited behind a completed walk reuses its result instead of walking
/// again. Cached trees are handed out as `Arc` snapshots and replaced
/// wholesale, so readers never observe a partially updated tree.
#[derive(Clone)]
pub struct ProjectSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    registry: ProjectRegistry,
    options: ScanOptions,
    dispatcher: Dispatcher,
    state: StateMutex<SessionState>,
    scans_completed: AtomicU64,
}

#[derive(Default)]
struct SessionState {
    trees: HashMap<String, Arc<ScanResult>>,
    /// Bumped once per stored walk; lets a queued rescan detect that the
    /// walk it waited on already produced a fresh tree.
    generations: HashMap<String, u64>,
    scan_locks: HashMap<String, Arc<ScanMutex<()>>>,
}

impl ProjectSession {
    pub fn new(
        registry: ProjectRegistry,
        options: ScanOptions,
    ) -> Result<Self, SessionCreationError> {
        let workers_num = Self::determine_worker_count();
        debug!("Using {} worker threads for project scans", workers_num);

        let dispatcher = DispatcherBuilder::new()
            .worker_threads(workers_num)
            .build()
            .context(DispatcherSnafu)?;

        Ok(ProjectSession {
            inner: Arc::new(SessionInner {
                registry,
                options,
                dispatcher,
                state: StateMutex::new(SessionState::default()),
                scans_completed: AtomicU64::new(0),
            }),
        })
    }

    /// Determines how many workers handle scan requests
    fn determine_worker_count() -> NonZeroUsize {
        available_parallelism()
            .map(|n| n.get())
            .map(NonZeroUsize::new)
            .ok()
            .flatten()
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_WORKER_THREADS).unwrap())
    }

    /// Opens a project: resolves its root through the registry, walks it and
    /// stores the fresh tree. The open action always reflects the disk, so
    /// this shares the rescan path.
    pub async fn open(&self, project_id: &str) -> Result<Arc<ScanResult>, SessionError> {
        info!("Opening project '{}'", project_id);
        self.rescan(project_id).await
    }

    /// Most recent cached tree, without touching the filesystem.
    pub fn get(&self, project_id: &str) -> Option<Arc<ScanResult>> {
        self.state().trees.get(project_id).cloned()
    }

    /// Forces a fresh walk of the project root and atomically replaces the
    /// cache entry. Concurrent calls for the same project serialize; a call
    /// that queued behind a walk that completed meanwhile returns that
    /// walk's tree instead of running a redundant one.
    pub async fn rescan(&self, project_id: &str) -> Result<Arc<ScanResult>, SessionError> {
        let entry = self
            .inner
            .registry
            .resolve(project_id)
            .cloned()
            .ok_or_else(|| SessionError::ProjectMissingError {
                project_id: project_id.to_string(),
            })?;

        let (scan_lock, generation_before) = {
            let mut state = self.state();
            let lock = state
                .scan_locks
                .entry(project_id.to_string())
                .or_default()
                .clone();
            let generation = state.generations.get(project_id).copied().unwrap_or(0);
            (lock, generation)
        };

        let _guard = scan_lock.lock().await;

        {
            let state = self.state();
            if state.generations.get(project_id).copied().unwrap_or(0) != generation_before
                && let Some(tree) = state.trees.get(project_id)
            {
                debug!(
                    "Rescan of '{}' coalesced into the walk that just completed",
                    project_id
                );
                return Ok(tree.clone());
            }
        }

        let root = entry.path.clone();
        let options = self.inner.options.clone();
        let receiver = self
            .inner
            .dispatcher
            .dispatch(move || async move { scan_project(&root, &options) })
            .map_err(|e| SessionError::ScanDispatchError {
                project_id: project_id.to_string(),
                error: e.to_string(),
            })?;

        let walk_outcome = receiver.await.context(ScanCanceledSnafu {
            project_id: project_id.to_string(),
        })?;

        let result = match walk_outcome {
            Ok(result) => Arc::new(result),
            Err(ScanError::NotFound { .. }) | Err(ScanError::AccessDenied { .. }) => {
                return Err(SessionError::ProjectMissingError {
                    project_id: project_id.to_string(),
                });
            }
            Err(source) => {
                return Err(SessionError::ScanFailedError {
                    project_id: project_id.to_string(),
                    source,
                });
            }
        };

        {
            let mut state = self.state();
            state.trees.insert(project_id.to_string(), result.clone());
            *state
                .generations
                .entry(project_id.to_string())
                .or_insert(0) += 1;
        }

        let total = self.inner.scans_completed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Stored walk #{} for project '{}'", total, project_id);

        Ok(result)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn scan_lock_for(&self, project_id: &str) -> Arc<ScanMutex<()>> {
        let mut state = self.state();
        state
            .scan_locks
            .entry(project_id.to_string())
            .or_default()
            .clone()
    }

    #[cfg(test)]
    fn scans_completed(&self) -> u64 {
        self.inner.scans_completed.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Snafu)]
pub enum SessionCreationError {
    #[snafu(display("Failed to create scan dispatcher"))]
    DispatcherError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display(
        "Project '{project_id}' is missing: not in the registry, or its folder is gone"
    ))]
    ProjectMissingError { project_id: String },
    #[snafu(display("Failed to dispatch scan for project '{project_id}': {error}"))]
    ScanDispatchError { project_id: String, error: String },
    #[snafu(display("Scan of project '{project_id}' got canceled"))]
    ScanCanceledError {
        project_id: String,
        source: futures_channel::oneshot::Canceled,
    },
    #[snafu(display("Failed to scan project '{project_id}'"))]
    ScanFailedError {
        project_id: String,
        source: ScanError,
    },
}
