//! Answers to `info` commands, read from the live tree.

use crate::error::EngineError;
use crate::parser::TargetInput;
use crate::widget::{MatchingService, WidgetDescriptor};
use serde_json::{json, Value};

fn descriptor_from(extra: Option<&str>) -> Result<WidgetDescriptor, EngineError> {
    let extra = extra
        .ok_or_else(|| EngineError::Unrecognizable("question needs a descriptor in extra".into()))?;
    let target: TargetInput = serde_json::from_str(extra)
        .map_err(|e| EngineError::Unrecognizable(format!("invalid descriptor in extra: {}", e)))?;
    target.into_descriptor()
}

pub async fn answer(
    matcher: &MatchingService,
    question: &str,
    extra: Option<&str>,
) -> Result<Value, EngineError> {
    match question {
        "focused" => {
            let focused = matcher.focused().await?;
            Ok(json!(focused))
        }
        "is_focused" => {
            let descriptor = descriptor_from(extra)?;
            let candidates = matcher.find_candidates(&descriptor).await?;
            let focused = matches!(candidates.as_slice(), [only] if only.accessibility_focused);
            Ok(json!(focused))
        }
        "candidates" => {
            let descriptor = descriptor_from(extra)?;
            let candidates = matcher.find_candidates(&descriptor).await?;
            Ok(json!(candidates))
        }
        "tree_size" => {
            let tree = matcher.driver().snapshot().await?;
            Ok(json!(tree.len()))
        }
        other => Err(EngineError::Unrecognizable(format!(
            "unknown question: {}",
            other
        ))),
    }
}
