use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::{ProjectSession, SessionError};
use crate::tree::{ScanResult, TreeNode};

/// Wire wrapper handed to the UI layer. `redirect: true` tells the caller
/// to navigate back to the project list; `file_tree` carries nothing useful
/// in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResultEnvelope {
    pub file_tree: Option<TreeNode>,
    pub redirect: bool,
    pub project_path: String,
}

impl ScanResultEnvelope {
    fn from_result(result: &ScanResult) -> Self {
        ScanResultEnvelope {
            file_tree: Some(result.root.clone()),
            redirect: false,
            project_path: result.project_root.display().to_string(),
        }
    }

    fn redirect() -> Self {
        ScanResultEnvelope {
            file_tree: None,
            redirect: true,
            project_path: String::new(),
        }
    }
}

/// Opens a project and returns its tree. Called by the UI when the project
/// view mounts.
pub async fn get_dirs(
    session: &ProjectSession,
    project_id: &str,
) -> Result<ScanResultEnvelope, SessionError> {
    envelope_for(session.open(project_id).await)
}

/// Forces a rescan of an already-open project. Called by the UI's "resync
/// folder" button.
pub async fn update_dirs(
    session: &ProjectSession,
    project_id: &str,
) -> Result<ScanResultEnvelope, SessionError> {
    envelope_for(session.rescan(project_id).await)
}

fn envelope_for(
    outcome: Result<Arc<ScanResult>, SessionError>,
) -> Result<ScanResultEnvelope, SessionError> {
    match outcome {
        Ok(result) => Ok(ScanResultEnvelope::from_result(&result)),
        Err(SessionError::ProjectMissingError { project_id }) => {
            warn!("Project '{}' is missing, redirecting the caller", project_id);
            Ok(ScanResultEnvelope::redirect())
        }
        Err(error) => Err(error),
    }
}
