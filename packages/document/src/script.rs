//! Injected script-execution capability.
//!
//! The codec owns the text-to-flag round trip for function-valued fields; it
//! never executes code. A host application that wants live page hooks
//! supplies a [`ScriptHost`] (typically wrapping a sandboxed interpreter) and
//! the renderer boundary compiles [`DynamicFn`]s through it.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::DynamicFn;

/// A compiled page hook. Arguments are bound positionally per
/// [`crate::model::HookSlot::call_params`].
pub type PageHookFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script host cannot compile hook: {0}")]
    Compile(String),
}

pub trait ScriptHost {
    fn compile(&self, params: &[String], body: &str) -> Result<PageHookFn, ScriptError>;
}

/// Turn a reconstructed hook into a callable via the injected host.
pub fn compile_hook(hook: &DynamicFn, host: &dyn ScriptHost) -> Result<PageHookFn, ScriptError> {
    host.compile(&hook.params, &hook.body)
}
