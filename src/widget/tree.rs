//! Owned snapshot of an accessibility tree.
//!
//! Drivers produce a fresh [`UiTree`] on every query. Nodes live in an arena and refer
//! to each other by index, so a snapshot is cheap to walk in both directions and never
//! observes mutations made after it was taken.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity a driver assigns to a live node so actions can be routed back to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u64);

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Get the center point of the bounds
    pub fn center(&self) -> (i32, i32) {
        let x = (self.left + self.right) / 2;
        let y = (self.top + self.bottom) / 2;
        (x, y)
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Parse bounds from string like "[0,0][1080,1920]"
    pub fn from_string(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split("][").collect();
        if parts.len() != 2 {
            return None;
        }

        let left_top = parts[0].trim_start_matches('[');
        let right_bottom = parts[1].trim_end_matches(']');

        let lt: Vec<i32> = left_top.split(',').filter_map(|s| s.parse().ok()).collect();
        let rb: Vec<i32> = right_bottom
            .split(',')
            .filter_map(|s| s.parse().ok())
            .collect();

        if lt.len() == 2 && rb.len() == 2 {
            Some(Bounds::new(lt[0], lt[1], rb[0], rb[1]))
        } else {
            None
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}][{},{}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Index of a node inside one [`UiTree`] snapshot
pub type NodeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct UiNode {
    pub handle: NodeHandle,
    pub class_name: String,
    pub resource_id: String,
    pub content_desc: String,
    pub text: String,
    pub visible: bool,
    pub clickable: bool,
    pub accessibility_focused: bool,
    pub bounds: Bounds,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

impl UiNode {
    pub fn new(handle: NodeHandle, class_name: &str) -> Self {
        Self {
            handle,
            class_name: class_name.to_string(),
            resource_id: String::new(),
            content_desc: String::new(),
            text: String::new(),
            visible: true,
            clickable: false,
            accessibility_focused: false,
            bounds: Bounds::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Whether a screen reader would stop on this node while swiping through the screen
    pub fn is_focusable(&self) -> bool {
        self.visible && (self.clickable || !self.text.is_empty() || !self.content_desc.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiTree {
    nodes: Vec<UiNode>,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as the root when `None`) and return its index
    pub fn push(&mut self, parent: Option<NodeIndex>, mut node: UiNode) -> NodeIndex {
        let index = self.nodes.len();
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }
        index
    }

    pub fn root(&self) -> Option<NodeIndex> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &UiNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut UiNode {
        &mut self.nodes[index]
    }

    pub fn get(&self, index: NodeIndex) -> Option<&UiNode> {
        self.nodes.get(index)
    }

    pub fn find_handle(&self, handle: NodeHandle) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.handle == handle)
    }

    /// Pre-order traversal from the root
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.root().into_iter().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            for child in self.nodes[index].children.iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    pub fn accessibility_focused(&self) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .find(|i| self.nodes[*i].accessibility_focused)
    }

    /// Nodes a screen reader visits when swiping forward, in visiting order
    pub fn focus_order(&self) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|i| self.nodes[*i].is_focusable())
            .collect()
    }

    /// Walk up from `index` (inclusive) to the first clickable node
    pub fn clickable_ancestor(&self, index: NodeIndex) -> Option<NodeIndex> {
        let mut current = Some(index);
        while let Some(i) = current {
            if self.nodes[i].clickable {
                return Some(i);
            }
            current = self.nodes[i].parent;
        }
        None
    }

    pub fn is_descendant_of(&self, index: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(i) = current {
            if i == ancestor {
                return true;
            }
            current = self.nodes[i].parent;
        }
        false
    }

    /// Deepest visible node whose bounds contain the point
    pub fn node_at(&self, x: i32, y: i32) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|i| {
                let n = &self.nodes[*i];
                n.visible && n.bounds.contains_point(x, y)
            })
            .last()
    }

    /// Move accessibility focus to `index`, clearing it everywhere else
    pub fn set_accessibility_focus(&mut self, index: Option<NodeIndex>) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.accessibility_focused = Some(i) == index;
        }
    }

    /// Neighbour of `current` in focus order. With no current focus, forward starts at
    /// the first focusable node and backward at the last.
    pub fn focus_neighbour(&self, current: Option<NodeIndex>, forward: bool) -> Option<NodeIndex> {
        let order = self.focus_order();
        let position = current.and_then(|c| order.iter().position(|i| *i == c));
        match (position, forward) {
            (None, true) => order.first().copied(),
            (None, false) => order.last().copied(),
            (Some(p), true) => order.get(p + 1).copied(),
            (Some(p), false) => p.checked_sub(1).and_then(|p| order.get(p).copied()),
        }
    }

    /// First focusable node outside the container of `current`, searching forward or
    /// backward in focus order. The container is the parent, or `current` itself when
    /// its parent is the root.
    pub fn jump_target(&self, current: Option<NodeIndex>, forward: bool) -> Option<NodeIndex> {
        let Some(current) = current else {
            return self.focus_neighbour(None, forward);
        };
        let container = match self.nodes[current].parent {
            Some(parent) if Some(parent) != self.root() => parent,
            _ => current,
        };
        let order = self.focus_order();
        let position = order.iter().position(|i| *i == current)?;
        let outside = |i: &&NodeIndex| **i != container && !self.is_descendant_of(**i, container);
        if forward {
            order[position + 1..].iter().find(outside).copied()
        } else {
            order[..position].iter().rev().find(outside).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(handle: u64, class: &str, text: &str) -> UiNode {
        let mut node = UiNode::new(NodeHandle(handle), class);
        node.text = text.to_string();
        node
    }

    fn sample() -> UiTree {
        // Frame
        //   Layout
        //     A, B
        //   Layout
        //     C
        let mut tree = UiTree::new();
        let root = tree.push(None, UiNode::new(NodeHandle(0), "Frame"));
        let first = tree.push(Some(root), UiNode::new(NodeHandle(1), "Layout"));
        tree.push(Some(first), leaf(2, "Text", "A"));
        tree.push(Some(first), leaf(3, "Text", "B"));
        let second = tree.push(Some(root), UiNode::new(NodeHandle(4), "Layout"));
        tree.push(Some(second), leaf(5, "Text", "C"));
        tree
    }

    #[test]
    fn test_bounds_from_string() {
        let b = Bounds::from_string("[0,10][100,210]").unwrap();
        assert_eq!(b, Bounds::new(0, 10, 100, 210));
        assert_eq!(b.center(), (50, 110));
        assert!(Bounds::from_string("garbage").is_none());
    }

    #[test]
    fn test_preorder_and_focus_order() {
        let tree = sample();
        assert_eq!(tree.preorder(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(tree.focus_order(), vec![2, 3, 5]);
    }

    #[test]
    fn test_focus_neighbour() {
        let tree = sample();
        assert_eq!(tree.focus_neighbour(None, true), Some(2));
        assert_eq!(tree.focus_neighbour(Some(2), true), Some(3));
        assert_eq!(tree.focus_neighbour(Some(5), true), None);
        assert_eq!(tree.focus_neighbour(Some(3), false), Some(2));
        assert_eq!(tree.focus_neighbour(Some(2), false), None);
    }

    #[test]
    fn test_jump_skips_rest_of_container() {
        let tree = sample();
        assert_eq!(tree.jump_target(Some(2), true), Some(5));
        assert_eq!(tree.jump_target(Some(5), false), Some(3));
    }

    #[test]
    fn test_jump_from_top_level_node_skips_its_subtree() {
        let mut tree = UiTree::new();
        let root = tree.push(None, UiNode::new(NodeHandle(0), "Frame"));
        let mut row = UiNode::new(NodeHandle(1), "Layout");
        row.clickable = true;
        let row = tree.push(Some(root), row);
        tree.push(Some(row), leaf(2, "Text", "Wi-Fi"));
        tree.push(Some(root), leaf(3, "Text", "About"));
        assert_eq!(tree.jump_target(Some(row), true), Some(3));
    }

    #[test]
    fn test_set_accessibility_focus_is_exclusive() {
        let mut tree = sample();
        tree.set_accessibility_focus(Some(2));
        tree.set_accessibility_focus(Some(5));
        assert_eq!(tree.accessibility_focused(), Some(5));
        assert!(!tree.node(2).accessibility_focused);
    }
}
