use super::descriptor::{Attribute, WidgetDescriptor};
use super::fingerprint::{compute_fingerprint, Fingerprint};
use super::tree::{Bounds, NodeHandle, NodeIndex, UiTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Projection of one live node at observation time.
///
/// Built fresh from every snapshot and never reused across scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcreteNode {
    pub handle: NodeHandle,
    pub resource_id: String,
    pub content_desc: String,
    pub text: String,
    pub class_name: String,
    pub xpath: Fingerprint,
    pub visible: bool,
    pub clickable: bool,
    pub accessibility_focused: bool,
    pub bounds: Bounds,
}

impl ConcreteNode {
    pub fn from_tree(tree: &UiTree, index: NodeIndex) -> Self {
        let node = tree.node(index);
        Self {
            handle: node.handle,
            resource_id: node.resource_id.clone(),
            content_desc: node.content_desc.clone(),
            text: node.text.clone(),
            class_name: node.class_name.clone(),
            xpath: compute_fingerprint(tree, index),
            visible: node.visible,
            clickable: node.clickable,
            accessibility_focused: node.accessibility_focused,
            bounds: node.bounds,
        }
    }

    pub fn value(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::ResourceId => &self.resource_id,
            Attribute::ContentDesc => &self.content_desc,
            Attribute::Text => &self.text,
            Attribute::ClassName => &self.class_name,
            Attribute::Xpath => self.xpath.as_str(),
        }
    }

    /// Same live node as `other`, judged by structure and driver identity
    pub fn is_same_node(&self, other: &ConcreteNode) -> bool {
        self.handle == other.handle && self.xpath == other.xpath
    }

    /// Copy every attribute into a descriptor that locates by fingerprint
    pub fn to_descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new()
            .with_resource_id(self.resource_id.clone())
            .with_content_desc(self.content_desc.clone())
            .with_text(self.text.clone())
            .with_class_name(self.class_name.clone())
            .with_xpath(self.xpath.as_str())
            .located_by(Attribute::Xpath)
    }

    /// Short human-readable form used by text reports
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("class={}", self.class_name)];
        if !self.resource_id.is_empty() {
            parts.push(format!("id={}", self.resource_id));
        }
        if !self.text.is_empty() {
            parts.push(format!("text=\"{}\"", self.text));
        }
        if !self.content_desc.is_empty() {
            parts.push(format!("desc=\"{}\"", self.content_desc));
        }
        parts.push(format!("xpath={}", self.xpath));
        parts.join(" ")
    }
}

impl fmt::Display for ConcreteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.handle, self.describe())
    }
}
