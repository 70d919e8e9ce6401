use std::path::PathBuf;

use colored::Colorize;
use snafu::prelude::*;
use supports_color::Stream;
use tracing::debug;

use crate::app::RuntimeConfig;
use crate::commands;
use crate::filter::filter_tree;
use crate::registry::{ProjectEntry, ProjectRegistry};
use crate::scanner::ScanOptions;
use crate::session::{ProjectSession, SessionCreationError, SessionError};
use crate::tree::TreeNode;

/// Project id used for the ad-hoc session the CLI wraps around its root
/// argument.
const CLI_PROJECT_ID: &str = "cli";

pub struct App;

impl App {
    pub async fn run(config: impl Into<RuntimeConfig>) -> Result<(), AppError> {
        let config: RuntimeConfig = config.into();

        let name = config
            .root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.root.display().to_string());
        let registry = ProjectRegistry::from_entries(vec![ProjectEntry {
            id: CLI_PROJECT_ID.to_string(),
            name,
            path: config.root.clone(),
            description: None,
        }]);
        let session = ProjectSession::new(registry, ScanOptions::default())
            .context(SessionCreationSnafu)?;

        let mut envelope = commands::get_dirs(&session, CLI_PROJECT_ID)
            .await
            .context(OpenSnafu)?;
        ensure!(
            !envelope.redirect,
            RootVanishedSnafu {
                path: config.root.clone()
            }
        );

        // The query applies to both output modes, JSON included.
        if let Some(tree) = envelope.file_tree.take() {
            envelope.file_tree = Some(apply_query(tree, config.query.as_deref()));
        }

        if config.json {
            let rendered =
                serde_json::to_string_pretty(&envelope).context(SerializeSnafu)?;
            println!("{rendered}");
            return Ok(());
        }

        let Some(tree) = envelope.file_tree else {
            return Ok(());
        };

        let colorize = supports_color::on(Stream::Stdout).is_some();
        print_tree(&tree, 0, colorize);

        Ok(())
    }
}

/// Filters `tree` with the CLI query, if any. An all-pruned filter falls
/// back to the unfiltered tree, never an empty view.
fn apply_query(tree: TreeNode, query: Option<&str>) -> TreeNode {
    match query {
        Some(query) if !query.is_empty() => match filter_tree(&tree, query) {
            Some(filtered) => filtered,
            None => {
                debug!("Nothing matched '{}', showing the full tree", query);
                tree
            }
        },
        _ => tree,
    }
}

fn print_tree(node: &TreeNode, depth: usize, colorize: bool) {
    let indent = "  ".repeat(depth);
    if node.is_material() {
        if colorize {
            println!("{indent}{}", node.name().cyan());
        } else {
            println!("{indent}{}", node.name());
        }
    } else {
        println!("{indent}{}/", node.name());
    }

    for child in node.children() {
        print_tree(child, depth + 1, colorize);
    }
}

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Critical failure while creating the project session"))]
    SessionCreationError { source: SessionCreationError },
    #[snafu(display("Failed to open the project folder"))]
    OpenError { source: SessionError },
    #[snafu(display("Project folder {} does not exist or cannot be read", path.display()))]
    RootVanishedError { path: PathBuf },
    #[snafu(display("Failed to render the tree as JSON"))]
    SerializeError { source: serde_json::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::directory(
            "proj",
            vec![TreeNode::material("stone"), TreeNode::material("wood")],
        )
    }

    #[test]
    fn test_query_narrows_the_tree() {
        let filtered = apply_query(sample_tree(), Some("wood"));

        assert_eq!(
            filtered,
            TreeNode::directory("proj", vec![TreeNode::material("wood")])
        );
    }

    #[test]
    fn test_unmatched_query_falls_back_to_the_full_tree() {
        assert_eq!(apply_query(sample_tree(), Some("xyz")), sample_tree());
    }

    #[test]
    fn test_absent_or_empty_query_is_identity() {
        assert_eq!(apply_query(sample_tree(), None), sample_tree());
        assert_eq!(apply_query(sample_tree(), Some("")), sample_tree());
    }
}
