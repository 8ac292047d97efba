//! Dispatcher: resolve, validate, invoke, normalize.
//!
//! Nothing past the guard is allowed to escape as a transport error. Unknown
//! tools, bad arguments, handler errors, panics (in the handler or its
//! summarizer), and timeouts all come back as an ordinary [`ToolResult`]
//! carrying one `Error: ...` block.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::normalize::{normalize, ToolResult};
use crate::tools::{Arguments, ToolOutcome, ToolRegistry};
use crate::types::{Error, InvocationId};

/// One inbound tool call. Wire shape: `{"tool": ..., "parameters": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(rename = "tool")]
    pub name: String,
    #[serde(rename = "parameters", default)]
    pub arguments: Arguments,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    handler_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            handler_timeout: None,
        }
    }

    /// Abort handlers that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, invocation: ToolInvocation) -> ToolResult {
        let invocation_id = InvocationId::new();
        let span = tracing::info_span!(
            "tool_call",
            tool = %invocation.name,
            invocation_id = %invocation_id,
        );
        self.execute(invocation).instrument(span).await
    }

    async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        let ToolInvocation { name, mut arguments } = invocation;

        let Some(definition) = self.registry.get(&name) else {
            tracing::warn!("unknown tool requested");
            return normalize(Error::unknown_tool(name).into(), None);
        };

        if let Err(e) = definition.schema().validate(&arguments) {
            tracing::warn!(kind = e.kind(), "argument validation failed: {}", e);
            return normalize(e.into(), None);
        }
        definition.schema().fill_defaults(&mut arguments);

        // Handler and summarizer both run on their own task, so a panic in
        // either is contained to this call.
        let handler = Arc::clone(definition.handler());
        let summarizer = definition.summarizer().cloned();
        let mut task = tokio::spawn(
            async move {
                let outcome = handler.call(arguments).await?;
                if let ToolOutcome::Failure(message) = &outcome {
                    tracing::warn!("tool reported failure: {}", message);
                }
                Ok::<_, Error>(normalize(outcome, summarizer.as_ref()))
            }
            .in_current_span(),
        );

        let joined = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    tracing::warn!(timeout = ?limit, "tool handler timed out");
                    return ToolResult::error(format!(
                        "tool '{}' timed out after {:?}",
                        name, limit
                    ));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(kind = e.kind(), "tool handler failed: {}", e);
                normalize(e.into(), None)
            }
            Err(join_err) if join_err.is_panic() => {
                tracing::error!("tool handler panicked");
                normalize(Error::internal(format!("tool '{}' panicked", name)).into(), None)
            }
            Err(join_err) => {
                tracing::error!("tool handler aborted: {}", join_err);
                normalize(Error::internal(format!("tool '{}' was cancelled", name)).into(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{handler_fn, ParamDef, ParamType, ToolDefinition};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn dispatcher(tools: Vec<ToolDefinition>) -> Dispatcher {
        Dispatcher::new(Arc::new(ToolRegistry::from_definitions(tools).unwrap()))
    }

    fn counting_tool(calls: Arc<AtomicUsize>) -> ToolDefinition {
        ToolDefinition::new(
            "get_document",
            "Fetch a document",
            handler_fn(move |args| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ToolOutcome::value(Value::Object(args)))
                }
            }),
        )
        .param(ParamDef::required("document_id", ParamType::String, "Document id"))
        .param(
            ParamDef::optional("format", ParamType::Enum(vec!["md".into(), "raw".into()]), "Format")
                .with_default(json!("md")),
        )
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_block_naming_tool() {
        let d = dispatcher(vec![]);
        let result = d.dispatch(ToolInvocation::new("launch_rockets", Arguments::new())).await;
        assert_eq!(result.content.len(), 1);
        let text = result.content[0].as_text();
        assert!(text.starts_with("Error: "), "{text}");
        assert!(text.contains("launch_rockets"));
    }

    #[tokio::test]
    async fn test_invalid_argument_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = dispatcher(vec![counting_tool(calls.clone())]);
        let result = d
            .dispatch(ToolInvocation::new("get_document", args(json!({"document_id": 12}))))
            .await;
        assert!(result.is_error());
        assert!(result.content[0].as_text().contains("document_id"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_call_fills_defaults_and_ignores_extras() {
        let calls = Arc::new(AtomicUsize::new(0));
        let d = dispatcher(vec![counting_tool(calls.clone())]);
        let result = d
            .dispatch(ToolInvocation::new(
                "get_document",
                args(json!({"document_id": "abc", "trace": true})),
            ))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let echoed: Value = serde_json::from_str(result.content[0].as_text()).unwrap();
        assert_eq!(echoed, json!({"document_id": "abc", "format": "md", "trace": true}));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_handler_error_becomes_failure_verbatim() {
        let d = dispatcher(vec![ToolDefinition::new(
            "web_search",
            "Search",
            handler_fn(|_| async { Err(Error::adapter("search backend: 503 Service Unavailable")) }),
        )]);
        let result = d.dispatch(ToolInvocation::new("web_search", Arguments::new())).await;
        assert_eq!(
            result.content[0].as_text(),
            "Error: search backend: 503 Service Unavailable"
        );
        assert!(logs_contain("tool handler failed"));
    }

    #[tokio::test]
    async fn test_handler_panic_is_contained() {
        let d = dispatcher(vec![
            ToolDefinition::new(
                "explode",
                "Panics",
                handler_fn(|_| async {
                    if true {
                        panic!("boom");
                    }
                    Ok(ToolOutcome::value(Value::Null))
                }),
            ),
            ToolDefinition::new(
                "ok",
                "Fine",
                handler_fn(|_| async { Ok(ToolOutcome::value(json!("fine"))) }),
            ),
        ]);
        let (bad, good) = tokio::join!(
            d.dispatch(ToolInvocation::new("explode", Arguments::new())),
            d.dispatch(ToolInvocation::new("ok", Arguments::new())),
        );
        assert!(bad.is_error());
        assert!(bad.content[0].as_text().contains("panicked"));
        assert_eq!(good.content[0].as_text(), "fine");
    }

    #[tokio::test]
    async fn test_summarizer_panic_is_contained() {
        let d = dispatcher(vec![ToolDefinition::new(
            "list_things",
            "Lists with a broken summary line",
            handler_fn(|_| async { Ok(ToolOutcome::list(vec![json!({"id": "1"})])) }),
        )
        .summary(|item| {
            let parts: Vec<&str> = Vec::new();
            format!("{}: {}", item["id"], parts[3])
        })]);

        let result = tokio::spawn(async move {
            d.dispatch(ToolInvocation::new("list_things", Arguments::new())).await
        })
        .await
        .expect("summarizer panic escaped dispatch");
        assert!(result.is_error());
        assert_eq!(result.content.len(), 1);
        assert!(result.content[0].as_text().contains("panicked"));
    }

    #[tokio::test]
    async fn test_timeout_aborts_handler() {
        let d = dispatcher(vec![ToolDefinition::new(
            "slow",
            "Never finishes in time",
            handler_fn(|_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(ToolOutcome::value(json!("late")))
            }),
        )])
        .with_timeout(Duration::from_millis(20));
        let result = d.dispatch(ToolInvocation::new("slow", Arguments::new())).await;
        assert!(result.is_error());
        assert!(result.content[0].as_text().contains("timed out"));
    }

    #[tokio::test]
    async fn test_pagination_cursor_passes_through() {
        let d = dispatcher(vec![ToolDefinition::new(
            "list_files",
            "List files",
            handler_fn(|args| async move {
                let cursor = args.get("cursor").and_then(Value::as_str).map(str::to_string);
                Ok(match cursor {
                    None => ToolOutcome::page(vec![json!({"id": "f1"})], Some("page-2".into())),
                    Some(_) => ToolOutcome::page(vec![json!({"id": "f2"})], None),
                })
            }),
        )
        .param(ParamDef::optional("cursor", ParamType::String, "Cursor"))
        .summary(|item| format!("file {}", item["id"].as_str().unwrap_or("?")))]);

        let first = d.dispatch(ToolInvocation::new("list_files", Arguments::new())).await;
        assert_eq!(first.next_cursor.as_deref(), Some("page-2"));
        assert_eq!(first.content[0].as_text(), "file f1");

        let second = d
            .dispatch(ToolInvocation::new("list_files", args(json!({"cursor": "page-2"}))))
            .await;
        assert!(second.next_cursor.is_none());
        assert_eq!(second.content[0].as_text(), "file f2");
    }

    #[test]
    fn test_invocation_wire_shape() {
        let inv: ToolInvocation =
            serde_json::from_value(json!({"tool": "web_search", "parameters": {"query": "q"}}))
                .unwrap();
        assert_eq!(inv.name, "web_search");
        assert_eq!(inv.arguments["query"], "q");

        let bare: ToolInvocation = serde_json::from_value(json!({"tool": "x"})).unwrap();
        assert!(bare.arguments.is_empty());
    }
}
