//! Structural fingerprints ("xpath") for accessibility nodes.
//!
//! A fingerprint is the root-to-node path of class names. A segment carries a 1-based
//! index only when its node is visible and shares its class with at least one other
//! visible sibling. Invisible siblings are left out of the count entirely, so an
//! invisible node can share the unindexed path of a visible sibling. That collision is
//! accepted.

use super::tree::{NodeIndex, UiTree};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Fingerprint(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Fingerprint(value.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path segment for one node relative to its parent
fn segment(tree: &UiTree, index: NodeIndex) -> String {
    let node = tree.node(index);
    let Some(parent) = node.parent else {
        return node.class_name.clone();
    };

    let mut count = 0;
    let mut position = None;
    for sibling in &tree.node(parent).children {
        let sibling_node = tree.node(*sibling);
        if !sibling_node.visible || sibling_node.class_name != node.class_name {
            continue;
        }
        count += 1;
        if *sibling == index {
            position = Some(count);
        }
    }

    match position {
        Some(p) if count > 1 => format!("{}[{}]", node.class_name, p),
        _ => node.class_name.clone(),
    }
}

/// Compute the fingerprint of `index` by walking its ancestors up to the root
pub fn compute_fingerprint(tree: &UiTree, index: NodeIndex) -> Fingerprint {
    let mut segments = Vec::new();
    let mut current = Some(index);
    while let Some(i) = current {
        segments.push(segment(tree, i));
        current = tree.node(i).parent;
    }
    segments.reverse();
    Fingerprint(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::tree::{NodeHandle, UiNode};
    use std::collections::HashSet;

    fn node(handle: u64, class: &str, visible: bool) -> UiNode {
        let mut n = UiNode::new(NodeHandle(handle), class);
        n.visible = visible;
        n
    }

    #[test]
    fn test_indexes_only_repeated_visible_classes() {
        let mut tree = UiTree::new();
        let root = tree.push(None, node(0, "Frame", true));
        let layout = tree.push(Some(root), node(1, "Layout", true));
        let first = tree.push(Some(layout), node(2, "Button", true));
        let second = tree.push(Some(layout), node(3, "Button", true));
        let label = tree.push(Some(layout), node(4, "Text", true));

        assert_eq!(compute_fingerprint(&tree, root).as_str(), "/Frame");
        assert_eq!(compute_fingerprint(&tree, layout).as_str(), "/Frame/Layout");
        assert_eq!(
            compute_fingerprint(&tree, first).as_str(),
            "/Frame/Layout/Button[1]"
        );
        assert_eq!(
            compute_fingerprint(&tree, second).as_str(),
            "/Frame/Layout/Button[2]"
        );
        assert_eq!(
            compute_fingerprint(&tree, label).as_str(),
            "/Frame/Layout/Text"
        );
    }

    #[test]
    fn test_invisible_siblings_are_not_counted() {
        let mut tree = UiTree::new();
        let root = tree.push(None, node(0, "Frame", true));
        let hidden = tree.push(Some(root), node(1, "Button", false));
        let shown = tree.push(Some(root), node(2, "Button", true));

        // The visible button is alone among visible buttons, so it stays unindexed,
        // and the hidden one collides with it.
        assert_eq!(compute_fingerprint(&tree, shown).as_str(), "/Frame/Button");
        assert_eq!(compute_fingerprint(&tree, hidden).as_str(), "/Frame/Button");
    }

    #[test]
    fn test_hidden_node_among_indexed_siblings_is_unindexed() {
        let mut tree = UiTree::new();
        let root = tree.push(None, node(0, "Frame", true));
        tree.push(Some(root), node(1, "Button", true));
        let hidden = tree.push(Some(root), node(2, "Button", false));
        let last = tree.push(Some(root), node(3, "Button", true));

        assert_eq!(compute_fingerprint(&tree, hidden).as_str(), "/Frame/Button");
        assert_eq!(compute_fingerprint(&tree, last).as_str(), "/Frame/Button[2]");
    }

    #[test]
    fn test_visible_siblings_get_distinct_fingerprints() {
        let mut tree = UiTree::new();
        let root = tree.push(None, node(0, "Frame", true));
        let mut indices = Vec::new();
        for (i, class) in ["Button", "Text", "Button", "Image", "Button", "Text"]
            .iter()
            .enumerate()
        {
            indices.push(tree.push(Some(root), node(i as u64 + 1, class, true)));
        }

        let unique: HashSet<Fingerprint> = indices
            .iter()
            .map(|i| compute_fingerprint(&tree, *i))
            .collect();
        assert_eq!(unique.len(), indices.len());
    }
}
