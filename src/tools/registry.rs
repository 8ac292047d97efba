//! Tool registry: the closed table of tools the gateway exposes.
//!
//! Built once at startup. Registration order is listing order; names are
//! case-sensitive and unique.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::outcome::ToolOutcome;
use super::schema::{Arguments, InputSchema, ParamDef};
use crate::types::{Error, Result};

/// Executes one tool. `Err` means the collaborator call itself failed; the
/// dispatcher turns it into a failure outcome with the message kept verbatim.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Arguments) -> Result<ToolOutcome>;
}

/// Adapts an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolOutcome>> + Send,
{
    async fn call(&self, args: Arguments) -> Result<ToolOutcome> {
        (self.0)(args).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolOutcome>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Renders one list item as a summary line (e.g. `id: name`).
pub type Summarizer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// A registered tool: name, description, input schema, handler.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    schema: InputSchema,
    handler: Arc<dyn ToolHandler>,
    summarizer: Option<Summarizer>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: InputSchema::default(),
            handler,
            summarizer: None,
        }
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.schema.params.push(param);
        self
    }

    pub fn summary<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.summarizer = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }

    pub fn summarizer(&self) -> Option<&Summarizer> {
        self.summarizer.as_ref()
    }

    /// Discovery view of this tool.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("signature", &self.schema.signature())
            .finish_non_exhaustive()
    }
}

/// Serializable tool listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Ordered name → definition table.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a table. Fails on the first duplicate name.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ToolDefinition>) -> Result<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Register a tool. A duplicate name is a startup error, never an overwrite.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<()> {
        if definition.name.is_empty() {
            return Err(Error::config("tool name cannot be empty"));
        }
        if self.index.contains_key(&definition.name) {
            return Err(Error::DuplicateTool(definition.name));
        }
        self.index
            .insert(definition.name.clone(), self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(ToolDefinition::descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
