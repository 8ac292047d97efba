//! Tool infrastructure: schemas, outcomes, the registry, and the built-in table.

pub mod builtin;
pub mod outcome;
pub mod registry;
pub mod schema;

pub use outcome::{Payload, ToolOutcome};
pub use registry::{
    handler_fn, FnHandler, Summarizer, ToolDefinition, ToolDescriptor, ToolHandler, ToolRegistry,
};
pub use schema::{Arguments, InputSchema, ParamDef, ParamType};
