use crate::tree::TreeNode;

/// Prunes `tree` down to the paths that match `query`, keeping the ancestor
/// chain of every match. Returns `None` when nothing matched at all; callers
/// fall back to the unfiltered tree in that case rather than showing an
/// empty view.
///
/// Matching rules, kept bit-for-bit compatible with the shipping UI:
/// - a material node survives when its name and the query contain each
///   other in either direction, case-insensitively;
/// - a plain directory survives when at least one child survived AND its
///   name is not a case-sensitive exact match of the query. The exact-match
///   exclusion is deliberate legacy behavior, not an oversight to repair.
///
/// An empty query is the identity. Pure function, no I/O, linear in the
/// size of the tree; cheap enough to run on every (debounced) keystroke.
pub fn filter_tree(tree: &TreeNode, query: &str) -> Option<TreeNode> {
    if query.is_empty() {
        return Some(tree.clone());
    }

    match tree {
        TreeNode::Material { name } => {
            names_overlap(name, query).then(|| tree.clone())
        }
        TreeNode::Directory { name, children } => {
            let surviving: Vec<TreeNode> = children
                .iter()
                .filter_map(|child| filter_tree(child, query))
                .collect();

            if name != query && !surviving.is_empty() {
                Some(TreeNode::Directory {
                    name: name.clone(),
                    children: surviving,
                })
            } else {
                None
            }
        }
    }
}

/// Symmetric case-insensitive containment: short queries match long names
/// and long queries match short names.
fn names_overlap(name: &str, query: &str) -> bool {
    let name = name.to_lowercase();
    let query = query.to_lowercase();
    name.contains(&query) || query.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn sample_tree() -> TreeNode {
        TreeNode::directory(
            "proj",
            vec![TreeNode::material("stone"), TreeNode::material("wood")],
        )
    }

    #[test]
    fn test_matching_material_keeps_its_ancestor_chain() {
        let filtered = filter_tree(&sample_tree(), "wood").expect("Expected a match");

        assert_eq!(
            filtered,
            TreeNode::directory("proj", vec![TreeNode::material("wood")])
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        assert_eq!(filter_tree(&sample_tree(), "xyz"), None);
    }

    #[test]
    fn test_empty_query_is_identity() {
        let tree = sample_tree();

        assert_eq!(filter_tree(&tree, ""), Some(tree));
    }

    #[rstest]
    #[case("WOOD")]
    #[case("woo")]
    #[case("wood_planks_old")]
    fn test_material_matching_is_symmetric_and_case_insensitive(#[case] query: &str) {
        let filtered = filter_tree(&sample_tree(), query).expect("Expected a match");

        assert_eq!(
            filtered.children(),
            &[TreeNode::material("wood")],
            "query {:?} should match the 'wood' material",
            query
        );
    }

    #[test]
    fn test_directory_named_exactly_like_query_is_pruned() {
        let tree = TreeNode::directory(
            "proj",
            vec![TreeNode::directory(
                "wood",
                vec![TreeNode::material("woodplank")],
            )],
        );

        // The subtree under the exactly-matching directory is discarded with
        // it, so nothing is left to keep the root alive.
        assert_eq!(filter_tree(&tree, "wood"), None);
    }

    #[test]
    fn test_exact_name_exclusion_is_case_sensitive() {
        let tree = TreeNode::directory(
            "proj",
            vec![TreeNode::directory(
                "Wood",
                vec![TreeNode::material("woodplank")],
            )],
        );

        let filtered = filter_tree(&tree, "wood").expect("Expected a match");

        assert_eq!(
            filtered,
            TreeNode::directory(
                "proj",
                vec![TreeNode::directory(
                    "Wood",
                    vec![TreeNode::material("woodplank")]
                )]
            )
        );
    }

    #[test]
    fn test_directory_without_surviving_children_is_pruned() {
        let tree = TreeNode::directory(
            "proj",
            vec![
                TreeNode::directory("stonework", vec![]),
                TreeNode::material("stone"),
            ],
        );

        let filtered = filter_tree(&tree, "stone").expect("Expected a match");

        // "stonework" contains the query but is a plain directory, and plain
        // directories only survive through their children.
        assert_eq!(filtered.children(), &[TreeNode::material("stone")]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let tree = TreeNode::directory(
            "proj",
            vec![
                TreeNode::directory(
                    "textures",
                    vec![TreeNode::material("stone"), TreeNode::material("stone_brick")],
                ),
                TreeNode::material("wood"),
            ],
        );

        let once = filter_tree(&tree, "stone").expect("Expected a match");
        let twice = filter_tree(&once, "stone").expect("Expected a match");

        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_of_surviving_children_is_preserved() {
        let tree = TreeNode::directory(
            "proj",
            vec![
                TreeNode::material("stone_brick"),
                TreeNode::material("wood"),
                TreeNode::material("stone"),
            ],
        );

        let filtered = filter_tree(&tree, "stone").expect("Expected a match");

        assert_eq!(
            filtered.children(),
            &[
                TreeNode::material("stone_brick"),
                TreeNode::material("stone")
            ]
        );
    }
}
