use super::descriptor::{Attribute, WidgetDescriptor};
use super::node::ConcreteNode;
use super::similarity::is_similar;
use super::tree::UiTree;
use crate::driver::traits::AccessibilityDriver;
use anyhow::Result;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// Scan a snapshot for nodes similar to `descriptor`.
///
/// Visible matches win. Invisible matches are only returned when nothing visible
/// matches, since some widgets are off-screen yet still reachable through the API.
pub fn find_candidates_in(
    tree: &UiTree,
    descriptor: &WidgetDescriptor,
    masked: &HashSet<Attribute>,
) -> Vec<ConcreteNode> {
    let (visible, hidden): (Vec<ConcreteNode>, Vec<ConcreteNode>) = tree
        .preorder()
        .into_iter()
        .map(|index| ConcreteNode::from_tree(tree, index))
        .filter(|node| is_similar(descriptor, node, masked))
        .partition(|node| node.visible);

    if visible.is_empty() {
        hidden
    } else {
        visible
    }
}

/// Resolves descriptors against the live accessibility tree
#[derive(Clone)]
pub struct MatchingService {
    driver: Arc<dyn AccessibilityDriver>,
    masked: HashSet<Attribute>,
}

impl MatchingService {
    pub fn new(driver: Arc<dyn AccessibilityDriver>, masked: &[Attribute]) -> Self {
        Self {
            driver,
            masked: masked.iter().copied().collect(),
        }
    }

    pub fn driver(&self) -> &Arc<dyn AccessibilityDriver> {
        &self.driver
    }

    pub fn masked(&self) -> &HashSet<Attribute> {
        &self.masked
    }

    /// Take a fresh snapshot and return the matching nodes. Empty means "not present now".
    pub async fn find_candidates(&self, descriptor: &WidgetDescriptor) -> Result<Vec<ConcreteNode>> {
        let tree = self.driver.snapshot().await?;
        let candidates = find_candidates_in(&tree, descriptor, &self.masked);
        debug!(
            "{} candidate(s) for {} among {} nodes",
            candidates.len(),
            descriptor,
            tree.len()
        );
        Ok(candidates)
    }

    /// Currently accessibility-focused node, if any
    pub async fn focused(&self) -> Result<Option<ConcreteNode>> {
        let tree = self.driver.snapshot().await?;
        Ok(tree
            .accessibility_focused()
            .map(|index| ConcreteNode::from_tree(&tree, index)))
    }
}
