use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One directory under a project root.
///
/// A material folder never carries children in the tree; its contents are
/// addressed directly by path (e.g. `<folder>/mat.yml`) when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NodeRepr", into = "NodeRepr")]
pub enum TreeNode {
    Directory {
        name: String,
        children: Vec<TreeNode>,
    },
    Material {
        name: String,
    },
}

impl TreeNode {
    pub fn directory(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Directory {
            name: name.into(),
            children,
        }
    }

    pub fn material(name: impl Into<String>) -> Self {
        TreeNode::Material { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } => name,
            TreeNode::Material { name } => name,
        }
    }

    pub fn is_material(&self) -> bool {
        matches!(self, TreeNode::Material { .. })
    }

    /// Children of a plain directory; a material node has none.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Directory { children, .. } => children,
            TreeNode::Material { .. } => &[],
        }
    }
}

/// Wire shape consumed by the rendering side: `children` is present
/// (possibly empty) for plain directories and omitted for material nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeRepr {
    name: String,
    is_mat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<NodeRepr>>,
}

impl From<TreeNode> for NodeRepr {
    fn from(node: TreeNode) -> Self {
        match node {
            TreeNode::Directory { name, children } => NodeRepr {
                name,
                is_mat: false,
                children: Some(children.into_iter().map(NodeRepr::from).collect()),
            },
            TreeNode::Material { name } => NodeRepr {
                name,
                is_mat: true,
                children: None,
            },
        }
    }
}

impl From<NodeRepr> for TreeNode {
    fn from(repr: NodeRepr) -> Self {
        if repr.is_mat {
            TreeNode::Material { name: repr.name }
        } else {
            TreeNode::Directory {
                name: repr.name,
                children: repr
                    .children
                    .unwrap_or_default()
                    .into_iter()
                    .map(TreeNode::from)
                    .collect(),
            }
        }
    }
}

/// Output of one full scan of a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub root: TreeNode,
    pub project_root: PathBuf,
}
