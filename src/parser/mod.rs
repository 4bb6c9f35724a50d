pub mod script;
pub mod types;

pub use script::{discover_scripts, load_use_case, parse_script};
pub use types::{CommandInput, ScriptFile, SleepValue, TargetInput};

use crate::command::{Action, Command};
use crate::error::EngineError;
use crate::widget::{Attribute, WidgetDescriptor};

/// Parse one serialized command (JSON object)
pub fn parse_command(json: &str) -> Result<Command, EngineError> {
    let input: CommandInput = serde_json::from_str(json)
        .map_err(|e| EngineError::Unrecognizable(format!("malformed command: {}", e)))?;
    input.into_command()
}

impl TargetInput {
    pub fn into_descriptor(self) -> Result<WidgetDescriptor, EngineError> {
        let mut descriptor = WidgetDescriptor::new()
            .with_resource_id(self.resource_id.unwrap_or_default())
            .with_content_desc(self.content_desc.unwrap_or_default())
            .with_text(self.text.unwrap_or_default())
            .with_class_name(self.class_name.unwrap_or_default())
            .with_xpath(self.xpath.unwrap_or_default());

        if let Some(name) = self.located_by.filter(|n| !n.is_empty()) {
            let attribute = Attribute::parse(&name).ok_or_else(|| {
                EngineError::Unrecognizable(format!("unknown located_by attribute: {}", name))
            })?;
            descriptor = descriptor.located_by(attribute);
        }
        Ok(descriptor)
    }
}

impl SleepValue {
    pub fn units(&self) -> Result<u64, EngineError> {
        match self {
            SleepValue::Units(units) => Ok(*units),
            SleepValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| EngineError::Unrecognizable(format!("invalid sleep: {:?}", text))),
        }
    }
}

impl CommandInput {
    fn descriptor(&mut self) -> Result<WidgetDescriptor, EngineError> {
        self.target
            .take()
            .ok_or_else(|| EngineError::Unrecognizable(format!("{} needs a target", self.action)))?
            .into_descriptor()
    }

    pub fn into_command(mut self) -> Result<Command, EngineError> {
        let action = match self.action.trim().to_lowercase().as_str() {
            "click" => Action::Click(self.descriptor()?),
            "focus" => Action::Focus(self.descriptor()?),
            "type" => {
                let target = self.descriptor()?;
                let text = self
                    .text
                    .take()
                    .ok_or_else(|| EngineError::Unrecognizable("type needs text".into()))?;
                Action::Type { target, text }
            }
            "back" => Action::Back,
            "next" => Action::Next,
            "previous" => Action::Previous,
            "jump_next" => Action::JumpNext,
            "jump_previous" => Action::JumpPrevious,
            "select" => Action::Select,
            "sleep" => {
                let sleep = self
                    .sleep
                    .as_ref()
                    .ok_or_else(|| EngineError::Unrecognizable("sleep needs a duration".into()))?;
                Action::Sleep(sleep.units()?)
            }
            "info" => {
                let question = self
                    .question
                    .take()
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| EngineError::Unrecognizable("info needs a question".into()))?;
                let extra = match self.extra.take() {
                    None | Some(serde_json::Value::Null) => None,
                    Some(serde_json::Value::String(s)) => Some(s),
                    Some(other) => Some(other.to_string()),
                };
                Action::Info { question, extra }
            }
            other => {
                return Err(EngineError::Unrecognizable(format!(
                    "unknown action: {:?}",
                    other
                )))
            }
        };
        Ok(Command::new(action).with_skip(self.skip))
    }
}
