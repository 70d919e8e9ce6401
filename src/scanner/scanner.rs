use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use snafu::Snafu;
use tracing::{debug, warn};

use crate::scanner::ScanOptions;
use crate::tree::{ScanResult, TreeNode};

/// Walks `root` and produces the normalized tree for one project.
///
/// Every directory is read exactly once. Subdirectories whose name is on the
/// denylist are dropped entirely; a subdirectory containing a material
/// descriptor among its direct files becomes a childless material node; all
/// other subdirectories are kept as plain directories, including empty ones.
/// Files never appear as nodes.
pub fn scan_project(root: &Path, options: &ScanOptions) -> Result<ScanResult, ScanError> {
    debug!("Scanning project root {}", root.display());
    let deadline = options.timeout.map(|limit| Instant::now() + limit);

    let (children, _) = walk_children(root, options, deadline)?;

    // The project root itself is never collapsed into a material node, even
    // when it carries a descriptor file of its own.
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    Ok(ScanResult {
        root: TreeNode::Directory { name, children },
        project_root: root.to_path_buf(),
    })
}

/// Enumerates one directory, returning its child nodes and whether a
/// material descriptor was found among its direct files.
fn walk_children(
    path: &Path,
    options: &ScanOptions,
    deadline: Option<Instant>,
) -> Result<(Vec<TreeNode>, bool), ScanError> {
    if let Some(deadline) = deadline
        && Instant::now() >= deadline
    {
        return Err(ScanError::Timeout {
            path: path.to_path_buf(),
        });
    }

    let entries = fs::read_dir(path).map_err(|source| classify_io_error(path, source))?;

    let mut children = Vec::new();
    let mut has_descriptor = false;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("Skipping unreadable entry in {}: {}", path.display(), error);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();

        if is_directory(&entry) {
            if options.is_denylisted(&name) {
                debug!("Dropping denylisted folder '{}'", name);
                continue;
            }

            match walk_children(&entry.path(), options, deadline) {
                Ok((grandchildren, child_has_descriptor)) => {
                    if child_has_descriptor {
                        children.push(TreeNode::Material { name });
                    } else {
                        children.push(TreeNode::Directory {
                            name,
                            children: grandchildren,
                        });
                    }
                }
                Err(error @ ScanError::Timeout { .. }) => return Err(error),
                Err(error) => {
                    // Degraded result: the folder stays in the tree but its
                    // contents are treated as empty.
                    warn!("Failed to enumerate {}: {}", entry.path().display(), error);
                    children.push(TreeNode::Directory {
                        name,
                        children: Vec::new(),
                    });
                }
            }
        } else if is_material_descriptor(&name) {
            has_descriptor = true;
        }
    }

    if options.sort_children {
        children.sort_by_key(|child| child.name().to_lowercase());
    }

    Ok((children, has_descriptor))
}

/// Whether a file name marks its parent directory as a material
/// (`mat*.yml` / `mat*.yaml`, case-insensitive).
fn is_material_descriptor(file_name: &str) -> bool {
    let lowered = file_name.to_lowercase();
    lowered.starts_with("mat") && (lowered.ends_with(".yml") || lowered.ends_with(".yaml"))
}

/// Directory check that resolves symlinks without an extra stat on the
/// common path.
fn is_directory(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(file_type) if file_type.is_symlink() => fs::metadata(entry.path())
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false),
        Ok(file_type) => file_type.is_dir(),
        Err(error) => {
            warn!(
                "Failed to read file type of {}: {}",
                entry.path().display(),
                error
            );
            false
        }
    }
}

fn classify_io_error(path: &Path, source: io::Error) -> ScanError {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound { path },
        io::ErrorKind::PermissionDenied => ScanError::AccessDenied { path, source },
        _ => ScanError::Read { path, source },
    }
}

#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(display("Project folder {} does not exist", path.display()))]
    NotFound { path: PathBuf },
    #[snafu(display("Project folder {} cannot be read", path.display()))]
    AccessDenied { path: PathBuf, source: io::Error },
    #[snafu(display("Failed to enumerate {}", path.display()))]
    Read { path: PathBuf, source: io::Error },
    #[snafu(display("Scan of {} exceeded the configured time limit", path.display()))]
    Timeout { path: PathBuf },
}
