//! # Pagecraft Editor
//!
//! Core state-transition engine for the Pagecraft editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: content model + classifier + codec│
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: AppState + mutation reducer          │
//! │  - Pure (state, mutation) -> state           │
//! │  - Structural edits on the content sequence  │
//! │  - Style table edits                         │
//! │  - Dirty tracking                            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: registry, persistence, import     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are immutable**: every mutation returns a fresh state;
//!    previously observed snapshots stay valid.
//! 2. **Graceful degradation**: type-mismatched updates are silent no-ops;
//!    only out-of-range indices are reported as errors.
//! 3. **Replayable**: mutations serialize, so an edit history is just data.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{AppState, Mutation};
//!
//! let state = AppState::new();
//! let next = Mutation::AddParagraph {
//!     index: None,
//!     value: "Hello".to_string(),
//! }
//! .apply(&state)?;
//! ```

mod mutations;
mod state;

pub use mutations::{Mutation, MutationError};
pub use state::AppState;

// Re-export common types for convenience
pub use pagecraft_document::{DocumentModel, Template};
