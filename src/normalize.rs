//! Response normalizer: every outcome becomes the same envelope.
//!
//! Failures become a single `Error: ...` block. Successes become one block per
//! list item (via the tool's summarizer) or one block holding the serialized
//! value. Fields a page carried beside its items follow as one trailing block.
//! Content is never empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{Payload, Summarizer, ToolOutcome};

/// Text of the single block produced for an empty success.
pub const NO_RESULTS: &str = "No results found.";

/// One unit of rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Final response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Set only by [`ToolResult::error`]. Not part of the wire envelope.
    #[serde(skip)]
    pub failed: bool,
}

impl ToolResult {
    fn success(content: Vec<ContentBlock>, next_cursor: Option<String>) -> Self {
        Self {
            content,
            next_cursor,
            failed: false,
        }
    }

    pub fn error(message: impl AsRef<str>) -> Self {
        Self {
            content: vec![ContentBlock::text(format!("Error: {}", message.as_ref()))],
            next_cursor: None,
            failed: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.failed
    }
}

/// Shape an outcome into the envelope, using the tool's summarizer for list items.
pub fn normalize(outcome: ToolOutcome, summarizer: Option<&Summarizer>) -> ToolResult {
    match outcome {
        ToolOutcome::Failure(message) => ToolResult::error(message),
        ToolOutcome::Success(Payload::Value(value)) => {
            ToolResult::success(vec![ContentBlock::text(render_value(&value))], None)
        }
        ToolOutcome::Success(Payload::List(items)) => {
            ToolResult::success(render_items(&items, summarizer), None)
        }
        ToolOutcome::Success(Payload::Page {
            items,
            next_cursor,
            extra,
        }) => {
            let mut content = render_items(&items, summarizer);
            if !extra.is_empty() {
                content.push(ContentBlock::text(render_value(&Value::Object(extra))));
            }
            ToolResult::success(content, next_cursor)
        }
    }
}

fn render_items(items: &[Value], summarizer: Option<&Summarizer>) -> Vec<ContentBlock> {
    if items.is_empty() {
        return vec![ContentBlock::text(NO_RESULTS)];
    }
    items
        .iter()
        .map(|item| {
            let line = summarizer.map(|f| f(item)).unwrap_or_default();
            // A summarizer that yields nothing must not hide the item.
            if line.trim().is_empty() {
                ContentBlock::text(render_value(item))
            } else {
                ContentBlock::text(line)
            }
        })
        .collect()
}

/// Serialized form of a value. Strings are emitted as-is.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => NO_RESULTS.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn id_name() -> Summarizer {
        Arc::new(|item: &Value| match (item["id"].as_str(), item["name"].as_str()) {
            (Some(id), Some(name)) => format!("{}: {}", id, name),
            _ => String::new(),
        })
    }

    fn texts(result: &ToolResult) -> Vec<&str> {
        result.content.iter().map(ContentBlock::as_text).collect()
    }

    #[test]
    fn test_failure_is_single_error_block() {
        let result = normalize(ToolOutcome::failure("backend exploded"), None);
        assert_eq!(texts(&result), vec!["Error: backend exploded"]);
        assert!(result.next_cursor.is_none());
        assert!(result.is_error());
    }

    #[test]
    fn test_list_is_one_block_per_item_in_order() {
        let outcome = ToolOutcome::list(vec![
            json!({"id": "b", "name": "Beta"}),
            json!({"id": "a", "name": "Alpha"}),
        ]);
        let result = normalize(outcome, Some(&id_name()));
        assert_eq!(texts(&result), vec!["b: Beta", "a: Alpha"]);
    }

    #[test]
    fn test_unsummarizable_item_is_serialized() {
        let outcome = ToolOutcome::list(vec![json!({"id": "a", "name": "Alpha"}), json!({"x": 1})]);
        let result = normalize(outcome, Some(&id_name()));
        assert_eq!(result.content.len(), 2);
        assert_eq!(result.content[1].as_text(), "{\n  \"x\": 1\n}");
    }

    #[test]
    fn test_empty_list_yields_no_results_block() {
        let result = normalize(ToolOutcome::list(vec![]), None);
        assert_eq!(texts(&result), vec![NO_RESULTS]);
        assert!(!result.is_error());

        let result = normalize(ToolOutcome::value(Value::Null), None);
        assert_eq!(texts(&result), vec![NO_RESULTS]);
    }

    #[test]
    fn test_structured_value_is_serialized_whole() {
        let value = json!({"id": "page-1", "properties": {"title": "Plan"}});
        let result = normalize(ToolOutcome::value(value.clone()), Some(&id_name()));
        assert_eq!(result.content.len(), 1);
        let parsed: Value = serde_json::from_str(result.content[0].as_text()).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_string_value_is_verbatim() {
        let result = normalize(ToolOutcome::value(json!("# README\nhello")), None);
        assert_eq!(texts(&result), vec!["# README\nhello"]);
    }

    #[test]
    fn test_page_carries_cursor_unchanged() {
        let outcome = ToolOutcome::page(vec![json!({"id": "1", "name": "One"})], Some("opaque==".to_string()));
        let result = normalize(outcome, Some(&id_name()));
        assert_eq!(result.next_cursor.as_deref(), Some("opaque=="));

        let last = normalize(ToolOutcome::page(vec![json!(1)], None), None);
        assert!(last.next_cursor.is_none());
    }

    #[test]
    fn test_page_extra_fields_follow_items() {
        let outcome = ToolOutcome::from_adapter_value(json!({
            "results": [{"id": "1", "name": "One"}],
            "nextCursor": "c-2",
            "total": 5000,
        }));
        let result = normalize(outcome, Some(&id_name()));
        assert_eq!(texts(&result), vec!["1: One", "{\n  \"total\": 5000\n}"]);
        assert_eq!(result.next_cursor.as_deref(), Some("c-2"));

        let empty = normalize(
            ToolOutcome::from_adapter_value(json!({"results": [], "hasMore": false})),
            None,
        );
        assert_eq!(texts(&empty), vec![NO_RESULTS, "{\n  \"hasMore\": false\n}"]);
    }

    #[test]
    fn test_error_flag_is_explicit() {
        let lookalike = normalize(ToolOutcome::value(json!("Error: this is a log line")), None);
        assert!(!lookalike.is_error());
        assert!(normalize(ToolOutcome::failure("boom"), None).is_error());
    }

    #[test]
    fn test_wire_format() {
        let result = ToolResult::success(vec![ContentBlock::text("a")], Some("c".to_string()));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"content": [{"type": "text", "text": "a"}], "nextCursor": "c"})
        );

        let without = ToolResult::error("nope");
        let wire = serde_json::to_value(&without).unwrap();
        assert_eq!(wire, json!({"content": [{"type": "text", "text": "Error: nope"}]}));
    }
}
