//! Built-in tool table: one entry per backend operation.
//!
//! Every handler relays its validated arguments to one backend operation and
//! converts the raw answer with [`ToolOutcome::from_adapter_value`]. List
//! results are summarized one line per item.

use serde_json::{json, Value};
use std::sync::Arc;

use super::outcome::ToolOutcome;
use super::registry::{handler_fn, ToolDefinition, ToolHandler};
use super::schema::{ParamDef, ParamType};
use crate::backends::{Backend, Backends};

/// The full tool table, in listing order.
pub fn builtin_tools(backends: &Backends) -> Vec<ToolDefinition> {
    let docs = &backends.document_store;
    let files = &backends.file_store;
    let code = &backends.code_host;
    let search = &backends.web_search;

    vec![
        // Document store
        ToolDefinition::new(
            "search_documents",
            "Search pages and databases in the document store by title or content",
            relay(docs, "search_documents"),
        )
        .param(ParamDef::required("query", ParamType::String, "Text to search for"))
        .param(cursor_param())
        .param(page_size_param(20))
        .summary(|item| line(item, &["id"], &["title", "name"])),
        ToolDefinition::new(
            "get_document",
            "Fetch a single page from the document store, including its content",
            relay(docs, "get_document"),
        )
        .param(ParamDef::required("document_id", ParamType::String, "Page identifier")),
        ToolDefinition::new(
            "query_database",
            "List the entries of a document-store database",
            relay(docs, "query_database"),
        )
        .param(ParamDef::required("database_id", ParamType::String, "Database identifier"))
        .param(cursor_param())
        .param(page_size_param(50))
        .summary(|item| line(item, &["id"], &["title", "name"])),
        // File store
        ToolDefinition::new(
            "list_files",
            "List files in a folder of the file store (root when no folder is given)",
            relay(files, "list_files"),
        )
        .param(ParamDef::optional("folder_id", ParamType::String, "Folder identifier"))
        .param(cursor_param())
        .param(page_size_param(50))
        .summary(file_line),
        ToolDefinition::new(
            "search_files",
            "Search the file store by file name or full text",
            relay(files, "search_files"),
        )
        .param(ParamDef::required("query", ParamType::String, "Text to search for"))
        .param(cursor_param())
        .summary(file_line),
        ToolDefinition::new(
            "get_file",
            "Fetch metadata and text content of one file",
            relay(files, "get_file"),
        )
        .param(ParamDef::required("file_id", ParamType::String, "File identifier")),
        // Code host
        ToolDefinition::new(
            "list_repositories",
            "List repositories owned by a user or organization",
            relay(code, "list_repositories"),
        )
        .param(ParamDef::required("owner", ParamType::String, "User or organization"))
        .param(
            ParamDef::optional(
                "visibility",
                enum_of(&["all", "public", "private"]),
                "Repository visibility filter",
            )
            .with_default(json!("all")),
        )
        .summary(|item| line(item, &["full_name", "name"], &["description"])),
        ToolDefinition::new(
            "get_file_contents",
            "Read a file from a repository",
            relay(code, "get_file_contents"),
        )
        .param(ParamDef::required("owner", ParamType::String, "Repository owner"))
        .param(ParamDef::required("repo", ParamType::String, "Repository name"))
        .param(ParamDef::required("path", ParamType::String, "Path inside the repository"))
        .param(ParamDef::optional("ref", ParamType::String, "Branch, tag, or commit")),
        ToolDefinition::new(
            "list_issues",
            "List issues of a repository",
            relay(code, "list_issues"),
        )
        .param(ParamDef::required("owner", ParamType::String, "Repository owner"))
        .param(ParamDef::required("repo", ParamType::String, "Repository name"))
        .param(
            ParamDef::optional("state", enum_of(&["open", "closed", "all"]), "Issue state")
                .with_default(json!("open")),
        )
        .param(ParamDef::optional("labels", ParamType::StringList, "Only issues with all these labels"))
        .param(cursor_param())
        .summary(issue_line),
        ToolDefinition::new(
            "create_issue",
            "Open a new issue in a repository",
            relay(code, "create_issue"),
        )
        .param(ParamDef::required("owner", ParamType::String, "Repository owner"))
        .param(ParamDef::required("repo", ParamType::String, "Repository name"))
        .param(ParamDef::required("title", ParamType::String, "Issue title"))
        .param(ParamDef::optional("body", ParamType::String, "Issue body (markdown)"))
        .param(ParamDef::optional("labels", ParamType::StringList, "Labels to apply")),
        // Web search
        ToolDefinition::new(
            "web_search",
            "Search the web and return ranked results",
            relay(search, "web_search"),
        )
        .param(ParamDef::required("query", ParamType::String, "Search query"))
        .param(ParamDef::optional("count", ParamType::Int, "Number of results").with_default(json!(10)))
        .param(
            ParamDef::optional("safe_search", ParamType::Bool, "Filter explicit results")
                .with_default(json!(true)),
        )
        .param(cursor_param())
        .summary(|item| line(item, &["title"], &["url"])),
    ]
}

fn relay(backend: &Arc<dyn Backend>, operation: &'static str) -> Arc<dyn ToolHandler> {
    let backend = Arc::clone(backend);
    handler_fn(move |args| {
        let backend = Arc::clone(&backend);
        async move {
            let raw = backend.call(operation, &args).await?;
            Ok(ToolOutcome::from_adapter_value(raw))
        }
    })
}

fn cursor_param() -> ParamDef {
    ParamDef::optional("cursor", ParamType::String, "Cursor from a previous page")
}

fn page_size_param(default: u32) -> ParamDef {
    ParamDef::optional("page_size", ParamType::Int, "Results per page").with_default(json!(default))
}

fn enum_of(variants: &[&str]) -> ParamType {
    ParamType::Enum(variants.iter().map(|v| v.to_string()).collect())
}

fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
}

fn first_display(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| item.get(*k)).find_map(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `key: label`, or just the key when the label is missing. Empty when there is
/// no key, which makes the normalizer fall back to the serialized item.
fn line(item: &Value, key_fields: &[&str], label_fields: &[&str]) -> String {
    match (first_display(item, key_fields), first_str(item, label_fields)) {
        (Some(key), Some(label)) => format!("{}: {}", key, label),
        (Some(key), None) => key,
        (None, _) => String::new(),
    }
}

fn file_line(item: &Value) -> String {
    let base = line(item, &["id"], &["name", "title"]);
    match (base.is_empty(), first_str(item, &["mimeType", "mime_type"])) {
        (false, Some(mime)) => format!("{} ({})", base, mime),
        _ => base,
    }
}

fn issue_line(item: &Value) -> String {
    let Some(number) = first_display(item, &["number"]) else {
        return String::new();
    };
    let title = first_str(item, &["title"]).unwrap_or("(untitled)");
    match first_str(item, &["state"]) {
        Some(state) => format!("#{}: {} [{}]", number, title, state),
        None => format!("#{}: {}", number, title),
    }
}
