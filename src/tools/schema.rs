//! Input schemas: typed parameter declarations and argument validation.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{Error, Result};

/// Tool arguments as received from the caller.
pub type Arguments = Map<String, Value>;

// =============================================================================
// Parameter types
// =============================================================================

/// Primitive type of a tool parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
    StringList,
    Enum(Vec<String>),
    Optional(Box<ParamType>),
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => expect(value.is_string(), "string", value),
            ParamType::Int => expect(value.is_i64() || value.is_u64(), "integer", value),
            ParamType::Float => expect(value.is_number(), "number", value),
            ParamType::Bool => expect(value.is_boolean(), "boolean", value),
            ParamType::StringList => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| format!("expected array, got {}", value_type_name(value)))?;
                for (i, item) in arr.iter().enumerate() {
                    if !item.is_string() {
                        return Err(format!(
                            "expected string at index {}, got {}",
                            i,
                            value_type_name(item)
                        ));
                    }
                }
                Ok(())
            }
            ParamType::Enum(variants) => {
                let s = value.as_str().ok_or_else(|| {
                    format!("expected string for enum, got {}", value_type_name(value))
                })?;
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!(
                        "invalid enum value '{}', expected one of: {}",
                        s,
                        variants.join(", ")
                    ))
                }
            }
            ParamType::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(value)
                }
            }
        }
    }

    /// Human-readable type name.
    pub fn display_name(&self) -> String {
        match self {
            ParamType::String => "string".to_string(),
            ParamType::Int => "integer".to_string(),
            ParamType::Float => "number".to_string(),
            ParamType::Bool => "boolean".to_string(),
            ParamType::StringList => "string[]".to_string(),
            ParamType::Enum(variants) => format!("enum({})", variants.join("|")),
            ParamType::Optional(inner) => format!("{}?", inner.display_name()),
        }
    }

    /// JSON Schema fragment for discovery listings.
    pub fn json_schema(&self) -> Value {
        match self {
            ParamType::String => json!({ "type": "string" }),
            ParamType::Int => json!({ "type": "integer" }),
            ParamType::Float => json!({ "type": "number" }),
            ParamType::Bool => json!({ "type": "boolean" }),
            ParamType::StringList => json!({ "type": "array", "items": { "type": "string" } }),
            ParamType::Enum(variants) => json!({ "type": "string", "enum": variants }),
            ParamType::Optional(inner) => inner.json_schema(),
        }
    }
}

fn expect(ok: bool, expected: &str, value: &Value) -> std::result::Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(format!("expected {}, got {}", expected, value_type_name(value)))
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self::required(name, ParamType::Optional(Box::new(param_type)), description)
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.param_type, ParamType::Optional(_))
    }
}

// =============================================================================
// Input schema
// =============================================================================

/// Declared parameters of one tool, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSchema {
    pub params: Vec<ParamDef>,
}

impl InputSchema {
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self { params }
    }

    /// Check arguments against the declared parameters.
    ///
    /// Reports the first offending field in declaration order. Arguments that
    /// are not declared are ignored.
    pub fn validate(&self, args: &Arguments) -> Result<()> {
        for param in &self.params {
            match args.get(&param.name) {
                None if param.is_required() => {
                    return Err(Error::invalid_argument(
                        &param.name,
                        format!("missing required {}", param.param_type.display_name()),
                    ));
                }
                None => {}
                Some(value) => {
                    // Defaulted parameters may be sent as null to mean "use the default".
                    if value.is_null() && param.default.is_some() {
                        continue;
                    }
                    param
                        .param_type
                        .validate(value)
                        .map_err(|reason| Error::invalid_argument(&param.name, reason))?;
                }
            }
        }
        Ok(())
    }

    /// Fill in default values for missing (or null) parameters.
    pub fn fill_defaults(&self, args: &mut Arguments) {
        for param in &self.params {
            if let Some(default) = &param.default {
                let missing = args.get(&param.name).map_or(true, Value::is_null);
                if missing {
                    args.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            let mut prop = param.param_type.json_schema();
            if let Some(obj) = prop.as_object_mut() {
                obj.insert("description".to_string(), json!(param.description));
                if let Some(default) = &param.default {
                    obj.insert("default".to_string(), default.clone());
                }
            }
            properties.insert(param.name.clone(), prop);
            if param.is_required() {
                required.push(param.name.clone());
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// One-line signature, e.g. `query: string, limit?: integer`.
    pub fn signature(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                let optional = if p.is_required() { "" } else { "?" };
                let ty = match &p.param_type {
                    ParamType::Optional(inner) => inner.display_name(),
                    other => other.display_name(),
                };
                format!("{}{}: {}", p.name, optional, ty)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn search_schema() -> InputSchema {
        InputSchema::new(vec![
            ParamDef::required("query", ParamType::String, "Search query"),
            ParamDef::optional("max_results", ParamType::Int, "Maximum results")
                .with_default(json!(10)),
            ParamDef::optional("cursor", ParamType::String, "Pagination cursor"),
        ])
    }

    #[test]
    fn test_validate_valid() {
        assert!(search_schema().validate(&args(json!({"query": "rust"}))).is_ok());
    }

    #[test]
    fn test_validate_missing_required() {
        let err = search_schema().validate(&args(json!({}))).unwrap_err();
        match err {
            Error::InvalidArgument { field, reason } => {
                assert_eq!(field, "query");
                assert!(reason.contains("missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_wrong_type_names_field() {
        let err = search_schema()
            .validate(&args(json!({"query": 42})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument 'query': expected string, got number"
        );
    }

    #[test]
    fn test_required_null_is_type_error() {
        let err = search_schema()
            .validate(&args(json!({"query": null})))
            .unwrap_err();
        assert!(err.to_string().contains("got null"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let result = search_schema().validate(&args(json!({"query": "x", "bogus": [1, 2]})));
        assert!(result.is_ok());
    }

    #[test]
    fn test_present_optional_is_type_checked() {
        let err = search_schema()
            .validate(&args(json!({"query": "x", "cursor": 7})))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref field, .. } if field == "cursor"));
        assert!(search_schema()
            .validate(&args(json!({"query": "x", "cursor": null})))
            .is_ok());
    }

    #[test]
    fn test_fill_defaults() {
        let mut a = args(json!({"query": "test"}));
        search_schema().fill_defaults(&mut a);
        assert_eq!(a["max_results"], 10);
        assert!(!a.contains_key("cursor"));

        let mut a = args(json!({"query": "test", "max_results": null}));
        search_schema().fill_defaults(&mut a);
        assert_eq!(a["max_results"], 10);
    }

    #[test]
    fn test_fill_defaults_no_overwrite() {
        let mut a = args(json!({"query": "test", "max_results": 5}));
        search_schema().fill_defaults(&mut a);
        assert_eq!(a["max_results"], 5);
    }

    #[test]
    fn test_json_schema() {
        assert_eq!(
            search_schema().to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "max_results": { "type": "integer", "description": "Maximum results", "default": 10 },
                    "cursor": { "type": "string", "description": "Pagination cursor" },
                },
                "required": ["query"],
            })
        );
    }

    #[test]
    fn test_signature() {
        assert_eq!(
            search_schema().signature(),
            "query: string, max_results?: integer, cursor?: string"
        );
    }

    #[test]
    fn test_param_type_enum_validation() {
        let pt = ParamType::Enum(vec!["asc".to_string(), "desc".to_string()]);
        assert!(pt.validate(&json!("asc")).is_ok());
        assert!(pt.validate(&json!("bad")).is_err());
        assert!(pt.validate(&json!(42)).is_err());
    }

    #[test]
    fn test_param_type_numbers() {
        assert!(ParamType::Int.validate(&json!(3)).is_ok());
        assert!(ParamType::Int.validate(&json!(3.5)).is_err());
        assert!(ParamType::Float.validate(&json!(3)).is_ok());
        assert!(ParamType::Float.validate(&json!(3.5)).is_ok());
        assert!(ParamType::Bool.validate(&json!("true")).is_err());
    }

    #[test]
    fn test_param_type_string_list_validation() {
        let pt = ParamType::StringList;
        assert!(pt.validate(&json!(["a", "b"])).is_ok());
        assert_eq!(
            pt.validate(&json!(["a", 2])).unwrap_err(),
            "expected string at index 1, got number"
        );
        assert!(pt.validate(&json!("not array")).is_err());
    }
}
