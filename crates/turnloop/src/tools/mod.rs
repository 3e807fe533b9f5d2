//! Tool abstractions for LLM function-calling.
//!
//! Every capability the model can invoke is a [`Tool`] implementor. Tools are
//! collected into a [`ToolSet`] which handles lookup, JSON Schema validation,
//! timeouts and result serialization.
//!
//! # Defining tools
//!
//! - **[`FnTool`]**: closure-based, deserializes typed arguments. Best for
//!   stateless tools.
//! - **`impl Tool`**: a struct with [`Tool::definition()`] and
//!   [`Tool::execute()`]. Best for tools that hold state such as an HTTP
//!   client or an API key.
//!
//! # Submodules
//!
//! - [`core`]: [`Tool`] trait, [`ToolSet`], [`FnTool`].
//! - [`arithmetic`]: `add`, `sub`, `mul`, `div` with finite-result checking.
//! - [`reflection`]: error text for failed calls, with recovery hints.

pub mod arithmetic;
pub mod core;
pub mod reflection;

pub use arithmetic::{Arithmetic, ArithmeticOp};
pub use core::{
    DEFAULT_MAX_RESULT_BYTES, DEFAULT_TOOL_TIMEOUT, FnTool, Tool, ToolFuture, ToolSet,
    parse_tool_args, truncate_result, validate_tool_arguments,
};
