use std::sync::Arc;

use futures::StreamExt;
use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::session::{ProjectSession, SessionError};
use crate::tree::ScanResult;

/// External triggers that may force a rescan of the active project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshSignal {
    /// The project view opened for this project.
    ProjectOpened(String),
    /// The project view closed; later triggers are ignored until the next
    /// `ProjectOpened`.
    ProjectClosed,
    /// Explicit user request ("resync folder").
    Resync,
    /// Extraction/import job state: `true` while running, `false` when done.
    /// Only the busy-to-idle transition triggers a rescan.
    ExtractionBusy(bool),
}

/// What subscribers receive after a triggered rescan settles.
#[derive(Debug, Clone)]
pub enum TreeEvent {
    Updated(Arc<ScanResult>),
    /// The project folder vanished; the view should navigate away.
    ProjectMissing { project_id: String },
}

/// Turns external signals into rescans of the active project and fans the
/// resulting trees out to subscribers.
///
/// Signals are handled strictly one at a time, so a rescan triggered for
/// one project can never publish after the view already switched to
/// another.
pub struct RefreshBridge {
    session: ProjectSession,
    subscribers: Vec<UnboundedSender<TreeEvent>>,
    active_project: Option<String>,
    extraction_busy: bool,
}

impl RefreshBridge {
    pub fn new(session: ProjectSession) -> Self {
        RefreshBridge {
            session,
            subscribers: Vec::new(),
            active_project: None,
            extraction_busy: false,
        }
    }

    /// Registers a consumer for future tree events. The subscription ends
    /// when the receiver is dropped.
    pub fn subscribe(&mut self) -> UnboundedReceiver<TreeEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Drains `signals` until the channel closes.
    pub async fn run(mut self, mut signals: UnboundedReceiver<RefreshSignal>) {
        debug!("Refresh bridge started");
        while let Some(signal) = signals.next().await {
            self.handle_signal(signal).await;
        }
        debug!("Refresh bridge stopped: signal channel closed");
    }

    pub async fn handle_signal(&mut self, signal: RefreshSignal) {
        match signal {
            RefreshSignal::ProjectOpened(project_id) => {
                debug!("Refresh bridge now tracking project '{}'", project_id);
                self.active_project = Some(project_id);
                self.extraction_busy = false;
            }
            RefreshSignal::ProjectClosed => {
                debug!("Refresh bridge detached from the project view");
                self.active_project = None;
                self.extraction_busy = false;
            }
            RefreshSignal::Resync => {
                self.rescan_active().await;
            }
            RefreshSignal::ExtractionBusy(true) => {
                debug!("Extraction job running; holding rescans");
                self.extraction_busy = true;
            }
            RefreshSignal::ExtractionBusy(false) => {
                if self.extraction_busy {
                    self.extraction_busy = false;
                    info!("Extraction job finished, resyncing project tree");
                    self.rescan_active().await;
                } else {
                    // Not a busy-to-idle transition; progress chatter and
                    // duplicate end markers are ignored.
                    debug!("Ignoring idle extraction signal without a preceding busy one");
                }
            }
        }
    }

    async fn rescan_active(&mut self) {
        let Some(project_id) = self.active_project.clone() else {
            debug!("Ignoring refresh trigger: no project view is open");
            return;
        };

        match self.session.rescan(&project_id).await {
            Ok(result) => self.publish(TreeEvent::Updated(result)),
            Err(SessionError::ProjectMissingError { project_id }) => {
                warn!("Project '{}' disappeared during refresh", project_id);
                self.publish(TreeEvent::ProjectMissing { project_id });
            }
            Err(error) => {
                // Keep the last good tree on screen rather than pushing a
                // broken state to consumers.
                warn!("Refresh of project '{}' failed: {}", project_id, error);
            }
        }
    }

    fn publish(&mut self, event: TreeEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(event.clone()).is_ok());
        debug!("Published tree event to {} subscriber(s)", self.subscribers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProjectEntry, ProjectRegistry};
    use crate::scanner::ScanOptions;
    use crate::session::ProjectSession;
    use crate::tree::TreeNode;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const PROJECT_ID: &str = "proj";

    fn bridge_for(root: &Path) -> RefreshBridge {
        let registry = ProjectRegistry::from_entries(vec![ProjectEntry {
            id: PROJECT_ID.to_string(),
            name: "Fixture".to_string(),
            path: root.to_path_buf(),
            description: None,
        }]);
        let session =
            ProjectSession::new(registry, ScanOptions::default()).expect("Failed to create session");
        RefreshBridge::new(session)
    }

    fn add_material(root: &Path, name: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("Failed to create material directory");
        fs::File::create(dir.join("mat.yml")).expect("Failed to create descriptor");
    }

    fn expect_updated(event: Option<TreeEvent>) -> Arc<ScanResult> {
        match event {
            Some(TreeEvent::Updated(result)) => result,
            other => panic!("Expected an Updated event, got {:?}", other),
        }
    }

    #[compio::test]
    async fn test_resync_publishes_a_fresh_tree() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        add_material(temp.path(), "wood");
        let mut bridge = bridge_for(temp.path());
        let mut events = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        bridge.handle_signal(RefreshSignal::Resync).await;

        let result = expect_updated(events.try_next().expect("Expected a pending event"));
        assert_eq!(result.root.children(), &[TreeNode::material("wood")]);
    }

    #[compio::test]
    async fn test_busy_idle_transition_triggers_exactly_one_rescan() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        add_material(temp.path(), "wood");
        let mut bridge = bridge_for(temp.path());
        let mut events = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        bridge.handle_signal(RefreshSignal::ExtractionBusy(true)).await;
        bridge.handle_signal(RefreshSignal::ExtractionBusy(true)).await;
        add_material(temp.path(), "stone");
        bridge.handle_signal(RefreshSignal::ExtractionBusy(false)).await;

        let result = expect_updated(events.try_next().expect("Expected a pending event"));
        assert_eq!(
            result.root.children(),
            &[TreeNode::material("stone"), TreeNode::material("wood")]
        );
        assert!(
            events.try_next().is_err(),
            "only the busy-to-idle transition may publish"
        );
    }

    #[compio::test]
    async fn test_idle_signal_without_busy_is_ignored() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let mut bridge = bridge_for(temp.path());
        let mut events = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        bridge.handle_signal(RefreshSignal::ExtractionBusy(false)).await;

        assert!(events.try_next().is_err(), "no event should be pending");
    }

    #[compio::test]
    async fn test_triggers_are_ignored_after_project_closed() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        add_material(temp.path(), "wood");
        let mut bridge = bridge_for(temp.path());
        let mut events = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        bridge.handle_signal(RefreshSignal::ProjectClosed).await;
        bridge.handle_signal(RefreshSignal::Resync).await;
        bridge.handle_signal(RefreshSignal::ExtractionBusy(false)).await;

        assert!(events.try_next().is_err(), "no event should be pending");
    }

    #[compio::test]
    async fn test_vanished_project_publishes_project_missing() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().join("pack");
        fs::create_dir(&root).expect("Failed to create project root");
        let mut bridge = bridge_for(&root);
        let mut events = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        fs::remove_dir_all(&root).expect("Failed to remove project root");
        bridge.handle_signal(RefreshSignal::Resync).await;

        match events.try_next().expect("Expected a pending event") {
            Some(TreeEvent::ProjectMissing { project_id }) => {
                assert_eq!(project_id, PROJECT_ID);
            }
            other => panic!("Expected ProjectMissing, got {:?}", other),
        }
    }

    #[compio::test]
    async fn test_run_loop_drains_the_signal_channel() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        add_material(temp.path(), "wood");
        let mut bridge = bridge_for(temp.path());
        let mut events = bridge.subscribe();

        let (signals, receiver) = mpsc::unbounded();
        signals
            .unbounded_send(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .expect("Failed to queue signal");
        signals
            .unbounded_send(RefreshSignal::Resync)
            .expect("Failed to queue signal");
        drop(signals);

        bridge.run(receiver).await;

        let result = expect_updated(events.try_next().expect("Expected a pending event"));
        assert_eq!(result.root.children(), &[TreeNode::material("wood")]);
    }

    #[compio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        add_material(temp.path(), "wood");
        let mut bridge = bridge_for(temp.path());

        let dropped = bridge.subscribe();
        drop(dropped);
        let mut kept = bridge.subscribe();

        bridge
            .handle_signal(RefreshSignal::ProjectOpened(PROJECT_ID.to_string()))
            .await;
        bridge.handle_signal(RefreshSignal::Resync).await;

        expect_updated(kept.try_next().expect("Expected a pending event"));
        assert_eq!(bridge.subscribers.len(), 1);
    }
}
