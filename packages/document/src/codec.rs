//! Text-safe persistence codec.
//!
//! The storage medium only holds text, but three document fields
//! (header/footer/background) may be functions. On the way out, a dynamic
//! hook is replaced by a sidecar string field (`_headerFunction`,
//! `_footerFunction`, `_backgroundFunction`) holding its source text, and the
//! original key is removed. On the way back in, sidecar text is parsed into a
//! reconstructible [`DynamicFn`]; text that cannot be parsed as a function is
//! dropped with a warning so corrupt persisted state never blocks loading the
//! rest of the document.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{DocumentModel, DynamicFn, HookSlot, PageHook, Template};

/// Convert a document to its stored (text-safe) form.
pub fn to_stored(doc: &DocumentModel) -> Value {
    let mut fields = Map::new();
    fields.insert("content".to_string(), Value::Array(doc.content.clone()));
    fields.insert("styles".to_string(), Value::Object(doc.styles.clone()));

    for slot in HookSlot::ALL {
        match doc.hook(slot) {
            Some(PageHook::Static(value)) => {
                fields.insert(slot.field().to_string(), value.clone());
            }
            Some(PageHook::Dynamic(hook)) => {
                fields.insert(slot.sidecar().to_string(), Value::String(hook.source.clone()));
            }
            None => {}
        }
    }

    for (key, value) in &doc.extra {
        fields.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(fields)
}

/// Rebuild a document from its stored form. Total: malformed input degrades
/// to the closest well-formed model rather than failing the load.
pub fn from_stored(value: &Value) -> DocumentModel {
    let Some(fields) = value.as_object() else {
        if !value.is_null() {
            warn!("stored document is not an object; starting from an empty model");
        }
        return DocumentModel::new();
    };

    let mut doc = DocumentModel::new();

    match fields.get("content") {
        Some(Value::Array(items)) => doc.content = items.clone(),
        Some(Value::Null) | None => {}
        // Hand-authored definitions may carry a single node as their content.
        Some(other) => doc.content = vec![other.clone()],
    }
    if let Some(Value::Object(styles)) = fields.get("styles") {
        doc.styles = styles.clone();
    }

    for slot in HookSlot::ALL {
        match fields.get(slot.sidecar()) {
            Some(Value::String(source)) => match parse_function_source(source) {
                Some(hook) => doc.set_hook(slot, Some(PageHook::Dynamic(hook))),
                None => warn!(
                    field = slot.sidecar(),
                    "persisted hook source is not a reconstructible function; dropping it"
                ),
            },
            Some(_) => warn!(
                field = slot.sidecar(),
                "persisted hook source is not a string; dropping it"
            ),
            None => {
                if let Some(value) = fields.get(slot.field()) {
                    if !value.is_null() {
                        doc.set_hook(slot, Some(PageHook::Static(value.clone())));
                    }
                }
            }
        }
    }

    for (key, value) in fields {
        if is_reserved_key(key) {
            continue;
        }
        doc.extra.insert(key.clone(), value.clone());
    }

    doc
}

fn is_reserved_key(key: &str) -> bool {
    if key == "content" || key == "styles" {
        return true;
    }
    HookSlot::ALL
        .iter()
        .any(|slot| key == slot.field() || key == slot.sidecar())
}

// ---------------------------------------------------------------------------
// Function source parsing
// ---------------------------------------------------------------------------

/// Parse function source text into a reconstructible [`DynamicFn`].
///
/// Accepts classic forms (`function (a, b) { ... }`, `function name(a) {}`)
/// and arrow forms (`(a, b) => expr`, `a => { ... }`). Declared parameter
/// names are preserved so references inside the body stay valid; arguments
/// are bound positionally per [`HookSlot::call_params`]. Returns `None` when
/// the text is not reconstructible code.
pub fn parse_function_source(source: &str) -> Option<DynamicFn> {
    let trimmed = source.trim();
    let (params_raw, body) = if let Some(rest) = trimmed.strip_prefix("function") {
        parse_function_form(rest)?
    } else {
        parse_arrow_form(trimmed)?
    };
    let params = parse_params(&params_raw)?;
    Some(DynamicFn {
        params,
        body,
        source: source.to_string(),
    })
}

fn parse_function_form(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim_start();
    let rest = if rest.starts_with('(') {
        rest
    } else {
        let open = rest.find('(')?;
        if !is_identifier(rest[..open].trim()) {
            return None;
        }
        &rest[open..]
    };
    let close = matching_delimiter(rest, '(', ')')?;
    let params = rest[1..close].to_string();
    let body = braced_body(rest[close + 1..].trim_start())?;
    Some((params, body))
}

fn parse_arrow_form(source: &str) -> Option<(String, String)> {
    let arrow = source.find("=>")?;
    let left = source[..arrow].trim();
    if left.is_empty() {
        return None;
    }
    let params = if left.starts_with('(') {
        if matching_delimiter(left, '(', ')')? != left.len() - 1 {
            return None;
        }
        left[1..left.len() - 1].to_string()
    } else {
        left.to_string()
    };
    let right = source[arrow + 2..].trim();
    if right.is_empty() {
        return None;
    }
    let body = if right.starts_with('{') {
        braced_body(right)?
    } else {
        format!("return {};", right)
    };
    Some((params, body))
}

fn braced_body(text: &str) -> Option<String> {
    if !text.starts_with('{') {
        return None;
    }
    let close = matching_delimiter(text, '{', '}')?;
    Some(text[1..close].trim().to_string())
}

/// Byte index of the delimiter closing `text[0]`, which must be `open`.
fn matching_delimiter(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn parse_params(raw: &str) -> Option<Vec<String>> {
    let mut params = Vec::new();
    for part in raw.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if !is_identifier(name) {
            return None;
        }
        params.push(name.to_string());
    }
    Some(params)
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// ---------------------------------------------------------------------------
// Template codec
// ---------------------------------------------------------------------------

pub fn template_to_stored(template: &Template) -> Value {
    let mut fields = Map::new();
    fields.insert("id".to_string(), Value::String(template.id.clone()));
    fields.insert("name".to_string(), Value::String(template.name.clone()));
    fields.insert("docDefinition".to_string(), to_stored(&template.doc));
    fields.insert(
        "createdAt".to_string(),
        Value::String(template.created_at.to_rfc3339()),
    );
    fields.insert(
        "updatedAt".to_string(),
        Value::String(template.updated_at.to_rfc3339()),
    );
    Value::Object(fields)
}

/// Rebuild a template from its stored form. `None` means the entry is too
/// corrupt to recover (no string id); missing timestamps fall back to now.
pub fn template_from_stored(value: &Value) -> Option<Template> {
    let fields = value.as_object()?;
    let id = fields.get("id")?.as_str()?.to_string();
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Untitled Template")
        .to_string();
    let doc = from_stored(fields.get("docDefinition").unwrap_or(&Value::Null));
    let now = Utc::now();
    Some(Template {
        id,
        name,
        doc,
        created_at: fields.get("createdAt").and_then(parse_rfc3339).unwrap_or(now),
        updated_at: fields.get("updatedAt").and_then(parse_rfc3339).unwrap_or(now),
    })
}

pub fn templates_to_json(templates: &[Template]) -> Result<String, serde_json::Error> {
    let value = Value::Array(templates.iter().map(template_to_stored).collect());
    serde_json::to_string_pretty(&value)
}

/// Parse a stored template list. Individual corrupt entries are skipped with
/// a warning rather than poisoning the whole load.
pub fn templates_from_json(text: &str) -> Result<Vec<Template>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let Some(items) = value.as_array() else {
        warn!("stored template list is not an array; ignoring it");
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| {
            let template = template_from_stored(item);
            if template.is_none() {
                warn!("skipping corrupt stored template entry");
            }
            template
        })
        .collect())
}

pub fn parse_rfc3339(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|stamp| stamp.with_timezone(&Utc))
}
