//! # Content Mutations
//!
//! The closed set of structural edits on the open document, applied through
//! a pure `(state, mutation) -> state` reducer.
//!
//! ## Semantics
//!
//! ### Indices
//! - Inserts use insertion-before semantics: an add at index `i` makes the
//!   new node `content[i]`. An omitted index appends; an index past the end
//!   clamps to append.
//! - Updates, deletes, and a move's source index must be in range; an
//!   out-of-range index is reported as [`MutationError::IndexOutOfRange`],
//!   never silently clamped.
//!
//! ### Type-mismatched updates
//! - An update whose target does not have the expected shape (a paragraph
//!   edit landing on a non-string, a text patch landing on a node without a
//!   `text` key) is a silent no-op. The precondition was violated by a stale
//!   UI reference, not by corrupt data, so nothing changes and the state
//!   stays clean. Callers cannot distinguish this from an already-equal
//!   update; tests pin the no-op down as intended behavior.
//!
//! ### Move
//! - Remove-then-insert against the post-removal sequence (single-splice):
//!   moving 0 to 2 in `[A,B,C,D]` yields `[B,C,A,D]`.
//!
//! ### Dirty tracking
//! - Every effective content or style mutation marks the state dirty and
//!   stamps the template's `updated_at`. Mutations with no current template
//!   return the state unchanged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use pagecraft_document::DocumentModel;

use crate::state::AppState;

/// Structural edits on the current template's document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a bare-string paragraph.
    AddParagraph { index: Option<usize>, value: String },

    /// Insert a text node, optionally bound to a named style.
    AddText {
        index: Option<usize>,
        text: String,
        style: Option<String>,
    },

    /// Insert an image node from authored fields (an `image` URI plus
    /// whatever sizing fields the author set).
    AddImage {
        index: Option<usize>,
        fields: Map<String, Value>,
    },

    /// Insert a list node (`ul` or `ol` plus marker fields).
    AddList {
        index: Option<usize>,
        fields: Map<String, Value>,
    },

    /// Insert a table node (`table.body` plus layout fields).
    AddTable {
        index: Option<usize>,
        fields: Map<String, Value>,
    },

    /// Insert an opaque custom node. The `_custom` marker is guaranteed on
    /// the inserted object so the classifier treats it as a leaf blob.
    AddCustom { index: Option<usize>, content: Value },

    /// Replace a paragraph's text. No-op unless the node is a plain string.
    UpdateParagraph { index: usize, value: String },

    /// Merge provided fields onto a text node. No-op unless the node has a
    /// `text` key. `text` may be a string or a span array.
    UpdateText {
        index: usize,
        text: Option<Value>,
        style: Option<Value>,
        name: Option<String>,
    },

    /// Merge fields onto an image node. No-op unless the node has an
    /// `image` key.
    UpdateImage {
        index: usize,
        fields: Map<String, Value>,
    },

    /// Merge fields onto a list node. No-op unless the node has `ul` or
    /// `ol`. A patch introducing `ol` drops `ul` (and vice versa), and the
    /// surviving items are coerced to strings, so a node never carries both
    /// list kinds.
    UpdateList {
        index: usize,
        fields: Map<String, Value>,
    },

    /// Merge fields onto a table node. The `table` sub-object is merged
    /// rather than replaced; a provided `body` replaces the prior body
    /// wholesale with every cell coerced to a string. No-op unless the node
    /// has a `table` key.
    UpdateTable {
        index: usize,
        fields: Map<String, Value>,
    },

    /// Splice-move: remove at `from`, insert into the post-removal sequence
    /// at `to` (clamped like a splice insert).
    MoveItem { from: usize, to: usize },

    DeleteItem { index: usize },

    /// Define or overwrite a named style.
    AddStyle { name: String, definition: Value },

    /// Merge a partial definition into a named style, creating it if absent.
    UpdateStyle { name: String, patch: Value },

    /// Move a style definition to a new name. No-op if `from` is absent.
    RenameStyle { from: String, to: String },

    /// Remove a named style. No-op if absent.
    DeleteStyle { name: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    #[error("index {index} out of range for content of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

impl Mutation {
    /// Apply to a state snapshot, returning the next snapshot. The input is
    /// never modified; with no current template every mutation is a no-op.
    pub fn apply(&self, state: &AppState) -> Result<AppState, MutationError> {
        let mut next = state.clone();

        let changed = {
            let Some(template) = next.current.as_mut() else {
                return Ok(next);
            };
            let changed = self.apply_to_doc(&mut template.doc)?;
            if changed {
                template.updated_at = Utc::now();
            }
            changed
        };

        if changed {
            next.dirty = true;
            self.adjust_selection(&mut next);
        }

        Ok(next)
    }

    /// Keep the selection pointing at the node it was on: deleting shifts or
    /// clears it, moving follows the moved node.
    fn adjust_selection(&self, state: &mut AppState) {
        match self {
            Mutation::DeleteItem { index } => {
                state.selected_index = match state.selected_index {
                    Some(selected) if selected == *index => None,
                    Some(selected) if selected > *index => Some(selected - 1),
                    other => other,
                };
            }
            Mutation::MoveItem { from, to } => {
                if state.selected_index == Some(*from) {
                    let len = state
                        .current
                        .as_ref()
                        .map(|template| template.doc.content.len())
                        .unwrap_or(0);
                    let dest = if len == 0 { 0 } else { (*to).min(len - 1) };
                    state.selected_index = Some(dest);
                }
            }
            _ => {}
        }
    }

    /// Returns whether the document actually changed. Err means the whole
    /// mutation was rejected and nothing was touched.
    fn apply_to_doc(&self, doc: &mut DocumentModel) -> Result<bool, MutationError> {
        match self {
            Mutation::AddParagraph { index, value } => {
                insert_at(&mut doc.content, *index, Value::String(value.clone()));
                Ok(true)
            }

            Mutation::AddText { index, text, style } => {
                let mut node = Map::new();
                node.insert("text".to_string(), Value::String(text.clone()));
                if let Some(style) = style {
                    node.insert("style".to_string(), Value::String(style.clone()));
                }
                insert_at(&mut doc.content, *index, Value::Object(node));
                Ok(true)
            }

            Mutation::AddImage { index, fields }
            | Mutation::AddList { index, fields }
            | Mutation::AddTable { index, fields } => {
                insert_at(&mut doc.content, *index, Value::Object(fields.clone()));
                Ok(true)
            }

            Mutation::AddCustom { index, content } => {
                let node = match content {
                    Value::Object(fields) => {
                        let mut fields = fields.clone();
                        fields.entry("_custom").or_insert(Value::Bool(true));
                        Value::Object(fields)
                    }
                    other => {
                        let mut fields = Map::new();
                        fields.insert("_custom".to_string(), Value::Bool(true));
                        fields.insert("content".to_string(), other.clone());
                        Value::Object(fields)
                    }
                };
                insert_at(&mut doc.content, *index, node);
                Ok(true)
            }

            Mutation::UpdateParagraph { index, value } => {
                let item = item_mut(&mut doc.content, *index)?;
                if item.is_string() {
                    *item = Value::String(value.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            Mutation::UpdateText {
                index,
                text,
                style,
                name,
            } => {
                let item = item_mut(&mut doc.content, *index)?;
                let Some(node) = item.as_object_mut() else {
                    return Ok(false);
                };
                if !node.contains_key("text") {
                    return Ok(false);
                }
                if let Some(text) = text {
                    node.insert("text".to_string(), text.clone());
                }
                if let Some(style) = style {
                    node.insert("style".to_string(), style.clone());
                }
                if let Some(name) = name {
                    node.insert("name".to_string(), Value::String(name.clone()));
                }
                Ok(true)
            }

            Mutation::UpdateImage { index, fields } => {
                let item = item_mut(&mut doc.content, *index)?;
                let Some(node) = item.as_object_mut() else {
                    return Ok(false);
                };
                if !node.contains_key("image") {
                    return Ok(false);
                }
                for (key, value) in fields {
                    node.insert(key.clone(), value.clone());
                }
                Ok(true)
            }

            Mutation::UpdateList { index, fields } => {
                let item = item_mut(&mut doc.content, *index)?;
                let Some(node) = item.as_object_mut() else {
                    return Ok(false);
                };
                if !node.contains_key("ul") && !node.contains_key("ol") {
                    return Ok(false);
                }
                for (key, value) in fields {
                    node.insert(key.clone(), value.clone());
                }
                // Switching list kind must not leave an ambiguous node.
                if fields.contains_key("ol") {
                    node.remove("ul");
                } else if fields.contains_key("ul") {
                    node.remove("ol");
                }
                for key in ["ul", "ol"] {
                    if let Some(Value::Array(items)) = node.get_mut(key) {
                        for item in items.iter_mut() {
                            *item = Value::String(coerce_string(item));
                        }
                    }
                }
                Ok(true)
            }

            Mutation::UpdateTable { index, fields } => {
                let item = item_mut(&mut doc.content, *index)?;
                let Some(node) = item.as_object_mut() else {
                    return Ok(false);
                };
                if !node.contains_key("table") {
                    return Ok(false);
                }
                for (key, value) in fields {
                    if key == "table" {
                        let patch = value.as_object().cloned().unwrap_or_default();
                        let entry = node
                            .entry("table")
                            .or_insert_with(|| Value::Object(Map::new()));
                        if !entry.is_object() {
                            *entry = Value::Object(Map::new());
                        }
                        if let Some(table) = entry.as_object_mut() {
                            for (table_key, table_value) in &patch {
                                if table_key == "body" {
                                    table.insert("body".to_string(), coerce_body(table_value));
                                } else {
                                    table.insert(table_key.clone(), table_value.clone());
                                }
                            }
                        }
                    } else {
                        node.insert(key.clone(), value.clone());
                    }
                }
                Ok(true)
            }

            Mutation::MoveItem { from, to } => {
                let len = doc.content.len();
                if *from >= len {
                    return Err(MutationError::IndexOutOfRange { index: *from, len });
                }
                let item = doc.content.remove(*from);
                let dest = (*to).min(doc.content.len());
                doc.content.insert(dest, item);
                Ok(true)
            }

            Mutation::DeleteItem { index } => {
                let len = doc.content.len();
                if *index >= len {
                    return Err(MutationError::IndexOutOfRange { index: *index, len });
                }
                doc.content.remove(*index);
                Ok(true)
            }

            Mutation::AddStyle { name, definition } => {
                doc.styles.insert(name.clone(), definition.clone());
                Ok(true)
            }

            Mutation::UpdateStyle { name, patch } => {
                match (doc.styles.get_mut(name), patch.as_object()) {
                    (Some(Value::Object(existing)), Some(patch_fields)) => {
                        for (key, value) in patch_fields {
                            existing.insert(key.clone(), value.clone());
                        }
                    }
                    _ => {
                        doc.styles.insert(name.clone(), patch.clone());
                    }
                }
                Ok(true)
            }

            Mutation::RenameStyle { from, to } => match doc.styles.remove(from) {
                Some(definition) => {
                    doc.styles.insert(to.clone(), definition);
                    Ok(true)
                }
                None => Ok(false),
            },

            Mutation::DeleteStyle { name } => Ok(doc.styles.remove(name).is_some()),
        }
    }
}

fn insert_at(content: &mut Vec<Value>, index: Option<usize>, item: Value) {
    let at = index.unwrap_or(content.len()).min(content.len());
    content.insert(at, item);
}

fn item_mut(content: &mut [Value], index: usize) -> Result<&mut Value, MutationError> {
    let len = content.len();
    content
        .get_mut(index)
        .ok_or(MutationError::IndexOutOfRange { index, len })
}

/// `String(cell ?? '')` equivalent for authored values that should be text.
fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// A replacement table body: rows kept as-is, every cell coerced to a string.
fn coerce_body(body: &Value) -> Value {
    match body {
        Value::Array(rows) => Value::Array(
            rows.iter()
                .map(|row| match row {
                    Value::Array(cells) => Value::Array(
                        cells
                            .iter()
                            .map(|cell| Value::String(coerce_string(cell)))
                            .collect(),
                    ),
                    other => Value::Array(vec![Value::String(coerce_string(other))]),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
