//! Import/export of templates as JSON text blobs.
//!
//! Import accepts a single object or an array, where each candidate is
//! either a full template (`{id, name, docDefinition, ...}`) or a bare
//! docDefinition. A declared id is always discarded: import allocates fresh
//! ids so an imported file can never overwrite an existing template, and ids
//! are accumulated across the batch so a timestamp-based generator cannot
//! collide with itself.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use pagecraft_document::{codec, Template};

use crate::ids;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("import candidate is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no template selected")]
    NothingSelected,

    #[error("export serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Split an import payload into candidate values. A single object imports as
/// a one-element batch.
pub fn parse_import(json: &str) -> Result<Vec<Value>, ImportError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

/// Normalize a batch sequentially. Fails as a whole if any candidate is not
/// an object; id allocation never fails.
pub fn import_many(
    candidates: &[Value],
    existing_ids: &HashSet<String>,
) -> Result<Vec<Template>, ImportError> {
    let mut taken = existing_ids.clone();
    let mut imported = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        imported.push(normalize_for_import(candidate, &mut taken)?);
    }
    Ok(imported)
}

/// Normalize one candidate into a template with a freshly allocated id.
pub fn normalize_for_import(
    candidate: &Value,
    taken: &mut HashSet<String>,
) -> Result<Template, ImportError> {
    let fields = candidate.as_object().ok_or(ImportError::NotAnObject)?;
    let now = Utc::now();

    let (name, doc, created_at, updated_at) = if let Some(definition) = fields.get("docDefinition")
    {
        // Full template shape. The declared id is intentionally ignored.
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Imported Template")
            .to_string();
        (
            name,
            codec::from_stored(definition),
            fields.get("createdAt").and_then(codec::parse_rfc3339).unwrap_or(now),
            fields.get("updatedAt").and_then(codec::parse_rfc3339).unwrap_or(now),
        )
    } else {
        // Bare docDefinition.
        (
            "Imported Template".to_string(),
            codec::from_stored(candidate),
            now,
            now,
        )
    };

    let id = ids::allocate_id(taken);
    taken.insert(id.clone());

    Ok(Template {
        id,
        name,
        doc,
        created_at,
        updated_at,
    })
}

pub fn export_template(template: &Template) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&codec::template_to_stored(
        template,
    ))?)
}

pub fn export_templates(templates: &[Template]) -> Result<String, ExportError> {
    Ok(codec::templates_to_json(templates)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_imports_as_one_candidate() {
        let candidates = parse_import(r#"{"content": ["hi"]}"#).expect("payload parses");
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn invalid_json_is_an_explicit_error() {
        assert!(matches!(
            parse_import("{not json"),
            Err(ImportError::InvalidJson(_))
        ));
    }

    #[test]
    fn non_object_candidate_is_rejected() {
        let mut taken = HashSet::new();
        assert!(matches!(
            normalize_for_import(&json!(42), &mut taken),
            Err(ImportError::NotAnObject)
        ));
    }

    #[test]
    fn bare_definition_gets_a_synthesized_name() {
        let mut taken = HashSet::new();
        let template = normalize_for_import(&json!({"content": ["hello"]}), &mut taken)
            .expect("candidate normalizes");
        assert_eq!(template.name, "Imported Template");
        assert_eq!(template.doc.content, vec![json!("hello")]);
    }

    #[test]
    fn declared_id_is_discarded() {
        let mut taken: HashSet<String> = ["tpl-claimed".to_string()].into_iter().collect();
        let template = normalize_for_import(
            &json!({"id": "tpl-claimed", "name": "Mine", "docDefinition": {"content": []}}),
            &mut taken,
        )
        .expect("candidate normalizes");
        assert_ne!(template.id, "tpl-claimed");
        assert_eq!(template.name, "Mine");
    }

    #[test]
    fn batch_ids_never_collide() {
        let existing: HashSet<String> = HashSet::new();
        let candidates: Vec<Value> = (0..8).map(|i| json!({"content": [format!("doc {i}")]})).collect();

        let imported = import_many(&candidates, &existing).expect("batch imports");
        let mut seen = HashSet::new();
        for template in &imported {
            assert!(seen.insert(template.id.clone()), "duplicate id {}", template.id);
        }
    }
}
