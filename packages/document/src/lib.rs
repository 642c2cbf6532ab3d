//! # Pagecraft Document
//!
//! The document content model for the Pagecraft editor.
//!
//! A document is a flat, ordered sequence of JSON-shaped content nodes plus a
//! named style table. Node kind is never tagged on the data; it is recovered
//! structurally by the [`classifier`] from the keys a node carries. The
//! [`codec`] converts documents to and from a text-safe persisted form,
//! extracting function-valued page hooks (header/footer/background) into
//! sidecar source-text fields and reconstituting them on load.

pub mod classifier;
pub mod codec;
pub mod model;
pub mod script;

pub use classifier::{classify, display_name, supports_custom_name, NodeKind};
pub use model::{DocumentModel, DynamicFn, HookSlot, PageHook, Template};
pub use script::{compile_hook, PageHookFn, ScriptError, ScriptHost};
