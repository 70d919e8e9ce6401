use std::time::Duration;

/// Directory names that never appear in a project tree, regardless of their
/// contents. These are resource-pack folders with no paintable textures.
const DEFAULT_DENYLIST: [&str; 8] = [
    "blockstates",
    "models",
    "texts",
    "shaders",
    "lang",
    "font",
    "atlases",
    "colormap",
];

/// Tuning knobs for a project scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory names excluded from the tree (compared case-insensitively).
    pub denylist: Vec<String>,
    /// Sort children by name (stable, case-insensitive, ascending) so that
    /// repeated scans of unchanged content produce identical trees.
    pub sort_children: bool,
    /// Upper bound for one whole scan. `None` leaves the scan bounded only
    /// by filesystem latency.
    pub timeout: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            denylist: DEFAULT_DENYLIST.iter().map(|name| name.to_string()).collect(),
            sort_children: true,
            timeout: None,
        }
    }
}

impl ScanOptions {
    /// Case folding matches the scanner's sort key and the filter, so a
    /// non-ASCII denylist entry compares the same way everywhere.
    pub fn is_denylisted(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.denylist.iter().any(|entry| entry.to_lowercase() == name)
    }
}
