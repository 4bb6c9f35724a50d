use serde::{Deserialize, Serialize};

/// Serialized form of one command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandInput {
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetInput>,

    /// Text for `type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Duration for `sleep`, usually string-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,

    /// Delegate instead of executing directly
    #[serde(default)]
    pub skip: bool,
}

/// Serialized widget descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetInput {
    #[serde(default, alias = "resourceId")]
    pub resource_id: Option<String>,
    #[serde(default, alias = "content_description", alias = "contentDesc")]
    pub content_desc: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "className")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default, alias = "locatedBy")]
    pub located_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SleepValue {
    Units(u64),
    Text(String),
}

/// A script file: either a bare list of commands or a named use case
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScriptFile {
    Commands(Vec<CommandInput>),
    Named {
        #[serde(default)]
        name: Option<String>,
        commands: Vec<CommandInput>,
    },
}
