//! Normalized representation of a project's directory tree.
//!
//! Only directories appear in the tree. A directory is either a plain,
//! traversable folder or a material node (a leaf identified by a material
//! descriptor file); the two cases are mutually exclusive by construction.

mod node;

pub use node::{ScanResult, TreeNode};
