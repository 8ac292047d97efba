//! Tool outcomes: the gateway's single success/failure union.
//!
//! Collaborators answer in whatever shape their API has (bare list, object
//! with an `error` field, `{results, nextCursor}` page). Handlers convert that
//! shape here, at the boundary, so nothing downstream special-cases a backend.

use serde_json::{Map, Value};

use crate::types::Error;

/// Successful payload, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Scalar or structured value, rendered as one block.
    Value(Value),
    /// Items rendered one block each.
    List(Vec<Value>),
    /// One page of items; `next_cursor` is set when more pages remain.
    /// `extra` holds any other fields the collaborator sent beside the items.
    Page {
        items: Vec<Value>,
        next_cursor: Option<String>,
        extra: Map<String, Value>,
    },
}

/// Result of one tool call. Never partially both.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Payload),
    Failure(String),
}

impl ToolOutcome {
    pub fn value(value: Value) -> Self {
        Self::Success(Payload::Value(value))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::Success(Payload::List(items))
    }

    pub fn page(items: Vec<Value>, next_cursor: Option<String>) -> Self {
        Self::Success(Payload::Page {
            items,
            next_cursor,
            extra: Map::new(),
        })
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Classify a raw collaborator response.
    ///
    /// - object with a non-null `error` → `Failure`
    /// - object with a `results` array → `Page` (cursor from `nextCursor` or
    ///   `next_cursor`; remaining fields kept as `extra`)
    /// - array → `List`
    /// - anything else → `Value`, serialized whole downstream
    pub fn from_adapter_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::list(items),
            Value::Object(mut map) => {
                if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                    return Self::Failure(error_message(error));
                }
                if matches!(map.get("results"), Some(Value::Array(_))) {
                    let next_cursor = cursor_field(&map, "nextCursor")
                        .or_else(|| cursor_field(&map, "next_cursor"));
                    if let Some(Value::Array(items)) = map.remove("results") {
                        map.remove("nextCursor");
                        map.remove("next_cursor");
                        return Self::Success(Payload::Page {
                            items,
                            next_cursor,
                            extra: map,
                        });
                    }
                }
                Self::value(Value::Object(map))
            }
            other => Self::value(other),
        }
    }
}

impl From<Error> for ToolOutcome {
    fn from(err: Error) -> Self {
        Self::Failure(err.to_string())
    }
}

fn cursor_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("message") {
            Some(Value::String(s)) => s.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_is_list() {
        assert_eq!(
            ToolOutcome::from_adapter_value(json!([{"id": 1}, {"id": 2}])),
            ToolOutcome::list(vec![json!({"id": 1}), json!({"id": 2})])
        );
    }

    #[test]
    fn test_error_field_is_failure() {
        assert_eq!(
            ToolOutcome::from_adapter_value(json!({"error": "Not found: page abc"})),
            ToolOutcome::failure("Not found: page abc")
        );
        assert_eq!(
            ToolOutcome::from_adapter_value(json!({"error": {"message": "quota", "code": 7}})),
            ToolOutcome::failure("quota")
        );
        assert_eq!(
            ToolOutcome::from_adapter_value(json!({"error": {"code": 7}})),
            ToolOutcome::failure(r#"{"code":7}"#)
        );
    }

    #[test]
    fn test_null_error_field_is_success() {
        let outcome = ToolOutcome::from_adapter_value(json!({"error": null, "id": "x"}));
        assert!(!outcome.is_failure());
    }

    #[test]
    fn test_results_object_is_page() {
        assert_eq!(
            ToolOutcome::from_adapter_value(json!({"results": [1, 2], "nextCursor": "c-2"})),
            ToolOutcome::page(vec![json!(1), json!(2)], Some("c-2".to_string()))
        );
        assert_eq!(
            ToolOutcome::from_adapter_value(json!({"results": [], "next_cursor": null})),
            ToolOutcome::page(vec![], None)
        );
    }

    #[test]
    fn test_page_keeps_sibling_fields() {
        let outcome =
            ToolOutcome::from_adapter_value(json!({"results": [], "total": 5000, "hasMore": true}));
        let ToolOutcome::Success(Payload::Page {
            items,
            next_cursor,
            extra,
        }) = &outcome
        else {
            panic!("expected a page, got {outcome:?}");
        };
        assert!(items.is_empty());
        assert!(next_cursor.is_none());
        assert_eq!(Value::Object(extra.clone()), json!({"total": 5000, "hasMore": true}));
    }

    #[test]
    fn test_results_not_array_is_plain_value() {
        let raw = json!({"results": "three", "nextCursor": "x"});
        assert_eq!(
            ToolOutcome::from_adapter_value(raw.clone()),
            ToolOutcome::value(raw)
        );
    }

    #[test]
    fn test_scalars_are_values() {
        assert_eq!(
            ToolOutcome::from_adapter_value(json!("plain text")),
            ToolOutcome::value(json!("plain text"))
        );
        assert_eq!(
            ToolOutcome::from_adapter_value(json!(42)),
            ToolOutcome::value(json!(42))
        );
    }

    #[test]
    fn test_from_error_keeps_message() {
        let outcome: ToolOutcome = Error::adapter("connection reset by peer").into();
        assert_eq!(outcome, ToolOutcome::failure("connection reset by peer"));
    }
}
