use super::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A comparable widget attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    ResourceId,
    #[serde(alias = "content_description")]
    ContentDesc,
    Text,
    ClassName,
    Xpath,
}

impl Attribute {
    /// Attributes compared by full-attribute equality (everything but the fingerprint)
    pub const CONTENT: [Attribute; 4] = [
        Attribute::ResourceId,
        Attribute::ContentDesc,
        Attribute::Text,
        Attribute::ClassName,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "resource_id" | "resourceId" | "id" => Some(Attribute::ResourceId),
            "content_desc" | "content_description" | "contentDesc" => {
                Some(Attribute::ContentDesc)
            }
            "text" => Some(Attribute::Text),
            "class_name" | "className" | "class" => Some(Attribute::ClassName),
            "xpath" => Some(Attribute::Xpath),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::ResourceId => "resource_id",
            Attribute::ContentDesc => "content_desc",
            Attribute::Text => "text",
            Attribute::ClassName => "class_name",
            Attribute::Xpath => "xpath",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Author-supplied identity of the widget a command targets.
///
/// Absent and empty attributes are the same state and are stored as empty strings.
/// A descriptor is immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    resource_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    content_desc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    class_name: String,
    #[serde(default, skip_serializing_if = "Fingerprint::is_empty")]
    xpath: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    located_by: Option<Attribute>,
}

impl WidgetDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource_id(mut self, value: impl Into<String>) -> Self {
        self.resource_id = value.into();
        self
    }

    pub fn with_content_desc(mut self, value: impl Into<String>) -> Self {
        self.content_desc = value.into();
        self
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.text = value.into();
        self
    }

    pub fn with_class_name(mut self, value: impl Into<String>) -> Self {
        self.class_name = value.into();
        self
    }

    pub fn with_xpath(mut self, value: impl Into<String>) -> Self {
        self.xpath = Fingerprint::from(value.into());
        self
    }

    pub fn located_by(mut self, attribute: Attribute) -> Self {
        self.located_by = Some(attribute);
        self
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn content_desc(&self) -> &str {
        &self.content_desc
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn xpath(&self) -> &Fingerprint {
        &self.xpath
    }

    pub fn locating_attribute(&self) -> Option<Attribute> {
        self.located_by
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

    /// The authoritative attribute is named but empty, so nothing can ever match.
    /// Callers treat this as a permanent failure rather than retrying.
    pub fn is_unlocatable(&self) -> bool {
        self.located_by
            .map(|attribute| self.value(attribute).is_empty())
            .unwrap_or(false)
    }
}

impl fmt::Display for WidgetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for attribute in [
            Attribute::ResourceId,
            Attribute::ContentDesc,
            Attribute::Text,
            Attribute::ClassName,
            Attribute::Xpath,
        ] {
            let value = self.value(attribute);
            if !value.is_empty() {
                parts.push(format!("{}=\"{}\"", attribute, value));
            }
        }
        if let Some(by) = self.located_by {
            parts.push(format!("by={}", by));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}
