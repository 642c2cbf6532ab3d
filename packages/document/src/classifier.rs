//! Structural node classification.
//!
//! Content nodes carry no kind tag; the logical kind is inferred from the
//! keys a node carries, in a fixed precedence order. The precedence is a
//! design contract, not an accident of probing order: an object that
//! structurally satisfies several shapes (say, both `text` and `table` keys)
//! classifies as the higher-precedence kind.
//!
//! Order: `_custom` marker, then `image`, `ul`/`ol`, `table`, `text`. A bare
//! string is a paragraph. Everything else is `Unknown`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The inferred logical kind of a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Paragraph,
    Text,
    Image,
    List,
    Table,
    /// Custom nodes and anything the shapes above do not cover.
    Unknown,
}

impl NodeKind {
    /// Human-readable label used for generated display names.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Text => "Text",
            NodeKind::Image => "Image",
            NodeKind::List => "List",
            NodeKind::Table => "Table",
            NodeKind::Unknown => "Custom",
        }
    }
}

/// Classify a content node by shape. Total: any JSON value maps to exactly
/// one kind, and nothing here can fail on untrusted input.
pub fn classify(item: &Value) -> NodeKind {
    match item {
        Value::String(_) => NodeKind::Paragraph,
        Value::Object(fields) => {
            if fields.contains_key("_custom") {
                NodeKind::Unknown
            } else if fields.contains_key("image") {
                NodeKind::Image
            } else if fields.contains_key("ul") || fields.contains_key("ol") {
                NodeKind::List
            } else if fields.contains_key("table") {
                NodeKind::Table
            } else if fields.contains_key("text") {
                NodeKind::Text
            } else {
                NodeKind::Unknown
            }
        }
        _ => NodeKind::Unknown,
    }
}

/// Display name for a node at `index` (0-based). A non-empty `name` field
/// wins; otherwise the kind label plus the 1-based position.
pub fn display_name(item: &Value, index: usize) -> String {
    if let Some(name) = item.get("name").and_then(Value::as_str) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    format!("{} {}", classify(item).label(), index + 1)
}

/// Whether a node can carry a custom `name`. Bare strings cannot hold
/// metadata; every other shape can.
pub fn supports_custom_name(item: &Value) -> bool {
    classify(item) != NodeKind::Paragraph
}
