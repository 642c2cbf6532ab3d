//! Template registry and lifecycle.
//!
//! Owns the set of templates, which one is open, and the mirror into the
//! persistent store. Every operation computes the next in-memory state
//! first; the store write that follows is best-effort (failures are logged,
//! never propagated), so storage trouble cannot corrupt or roll back a
//! state transition.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use pagecraft_document::{codec, Template};
use pagecraft_editor::{AppState, Mutation, MutationError};

use crate::ids;
use crate::interchange::{self, ExportError, ImportError};
use crate::renderer::{DocumentRenderer, RenderError};
use crate::store::{keys, TextStore};

const UNTITLED_NAME: &str = "Untitled Template";

/// The engine's front door: editor state plus its persistence mirror.
pub struct TemplateWorkspace {
    state: AppState,
    store: Box<dyn TextStore>,
}

impl TemplateWorkspace {
    /// Start with a fresh, never-saved template.
    pub fn new(store: Box<dyn TextStore>) -> Self {
        let state = AppState {
            current: Some(blank_template(&HashSet::new())),
            ..AppState::new()
        };
        Self { state, store }
    }

    /// Rebuild state from the store. Prefers the template-list key; falls
    /// back to wrapping the legacy single-document key into an ad hoc
    /// template. Anything unreadable degrades to a fresh workspace.
    pub fn load(store: Box<dyn TextStore>) -> Self {
        let mut state = AppState::new();

        match store.get(keys::TEMPLATES) {
            Ok(Some(text)) => match codec::templates_from_json(&text) {
                Ok(templates) => state.templates = templates,
                Err(err) => warn!(error = %err, "stored template list is unreadable; ignoring it"),
            },
            Ok(None) => match store.get(keys::LEGACY_DOCUMENT) {
                Ok(Some(text)) => match serde_json::from_str::<Value>(&text) {
                    Ok(value) => {
                        let mut template =
                            Template::new(ids::allocate_id(&HashSet::new()), UNTITLED_NAME);
                        template.doc = codec::from_stored(&value);
                        state.templates.push(template);
                        debug!("recovered legacy single-document state");
                    }
                    Err(err) => {
                        warn!(error = %err, "legacy document state is unreadable; ignoring it")
                    }
                },
                Ok(None) => {}
                Err(err) => warn!(error = %err, "failed to read legacy document state"),
            },
            Err(err) => warn!(error = %err, "failed to read stored template list"),
        }

        let stored_id = match store.get(keys::CURRENT_TEMPLATE_ID) {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "failed to read current template id");
                None
            }
        };
        state.current = stored_id
            .and_then(|id| state.templates.iter().find(|t| t.id == id).cloned())
            .or_else(|| state.templates.first().cloned());
        if state.current.is_none() {
            let taken = state.templates.iter().map(|t| t.id.clone()).collect();
            state.current = Some(blank_template(&taken));
        }

        match store.get(keys::FILENAME) {
            Ok(Some(filename)) => state.filename = filename,
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to read stored filename"),
        }

        Self { state, store }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn current(&self) -> Option<&Template> {
        self.state.current.as_ref()
    }

    pub fn templates(&self) -> &[Template] {
        &self.state.templates
    }

    /// Apply a content/style mutation to the open template, then autosave
    /// the document to the legacy key.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        self.state = mutation.apply(&self.state)?;
        self.mirror_document();
        Ok(())
    }

    /// Switch the open template. Unknown ids are ignored; switching clears
    /// the selection and the dirty flag.
    pub fn select_template(&mut self, id: &str) {
        let Some(found) = self.state.templates.iter().find(|t| t.id == id).cloned() else {
            return;
        };
        let mut next = self.state.clone();
        next.current = Some(found);
        next.selected_index = None;
        next.dirty = false;
        self.state = next;
        self.mirror_current_id();
    }

    /// Upsert the open template into the registry by id and clear the dirty
    /// flag. Saving an already-saved state leaves the registry unchanged.
    pub fn save(&mut self) {
        let mut next = self.state.clone();
        let Some(current) = next.current.as_mut() else {
            return;
        };
        if next.dirty {
            current.updated_at = Utc::now();
        }
        let snapshot = current.clone();
        match next.templates.iter_mut().find(|t| t.id == snapshot.id) {
            Some(slot) => *slot = snapshot,
            None => next.templates.push(snapshot),
        }
        next.dirty = false;
        self.state = next;
        self.mirror_templates();
        self.mirror_current_id();
    }

    /// Remove a template. If it was open, the first remaining template (or
    /// a null current) takes its place.
    pub fn delete_template(&mut self, id: &str) {
        if !self.state.templates.iter().any(|t| t.id == id) {
            return;
        }
        let mut next = self.state.clone();
        next.templates.retain(|t| t.id != id);
        if next.current.as_ref().map(|t| t.id.as_str()) == Some(id) {
            next.current = next.templates.first().cloned();
            next.selected_index = None;
            next.dirty = false;
        }
        self.state = next;
        self.mirror_templates();
        self.mirror_current_id();
    }

    /// Deep-copy a template under a fresh id and `"Copy of {name}"`, add it
    /// to the registry, and open it. Returns the new id.
    pub fn duplicate(&mut self, id: &str) -> Option<String> {
        let source = self
            .state
            .templates
            .iter()
            .find(|t| t.id == id)
            .or_else(|| self.state.current.as_ref().filter(|t| t.id == id))?
            .clone();

        let mut next = self.state.clone();
        let taken = known_ids(&next);
        let names: HashSet<String> = next.templates.iter().map(|t| t.name.clone()).collect();
        let now = Utc::now();

        let copy = Template {
            id: ids::allocate_id(&taken),
            name: ids::generate_unique_name(&format!("Copy of {}", source.name), &names),
            doc: source.doc.clone(),
            created_at: now,
            updated_at: now,
        };
        let copy_id = copy.id.clone();

        next.templates.push(copy.clone());
        next.current = Some(copy);
        next.selected_index = None;
        next.dirty = false;
        self.state = next;
        self.mirror_templates();
        self.mirror_current_id();
        Some(copy_id)
    }

    /// Open a fresh, empty template. It joins the registry on first save.
    pub fn new_template(&mut self) {
        let mut next = self.state.clone();
        let taken = known_ids(&next);
        next.current = Some(blank_template(&taken));
        next.selected_index = None;
        next.dirty = false;
        self.state = next;
        self.mirror_current_id();
    }

    /// Import one or many templates from a JSON blob. Never overwrites:
    /// every imported template gets a fresh id and a unique name. Returns
    /// the number imported; on error the registry is untouched.
    pub fn import(&mut self, json: &str) -> Result<usize, ImportError> {
        let candidates = interchange::parse_import(json)?;
        let existing = known_ids(&self.state);
        let mut imported = interchange::import_many(&candidates, &existing)?;

        let mut names: HashSet<String> =
            self.state.templates.iter().map(|t| t.name.clone()).collect();
        for template in &mut imported {
            let unique = ids::generate_unique_name(&template.name, &names);
            names.insert(unique.clone());
            template.name = unique;
        }

        let count = imported.len();
        let mut next = self.state.clone();
        next.templates.extend(imported);
        self.state = next;
        self.mirror_templates();
        Ok(count)
    }

    pub fn export_current(&self) -> Result<String, ExportError> {
        let current = self
            .state
            .current
            .as_ref()
            .ok_or(ExportError::NothingSelected)?;
        interchange::export_template(current)
    }

    pub fn export_all(&self) -> Result<String, ExportError> {
        interchange::export_templates(&self.state.templates)
    }

    /// Rename the open template. The dirty flag covers name divergence too.
    pub fn rename_current(&mut self, name: &str) {
        let Some(current) = self.state.current.as_mut() else {
            return;
        };
        if current.name == name {
            return;
        }
        current.name = name.to_string();
        current.updated_at = Utc::now();
        self.state.dirty = true;
    }

    pub fn select_item(&mut self, index: Option<usize>) {
        self.state.select_item(index);
    }

    pub fn set_filename(&mut self, filename: &str) {
        self.state.filename = filename.to_string();
        if let Err(err) = self.store.set(keys::FILENAME, filename) {
            warn!(error = %err, "failed to mirror filename to storage");
        }
    }

    pub fn set_preview_mode(&mut self, on: bool) {
        self.state.preview_mode = on;
    }

    pub fn set_loading(&mut self, on: bool) {
        self.state.loading = on;
    }

    /// Theme is a host concern; the engine only passes the key through.
    pub fn theme(&self) -> Option<String> {
        match self.store.get(keys::THEME) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to read theme from storage");
                None
            }
        }
    }

    pub fn set_theme(&mut self, theme: &str) {
        if let Err(err) = self.store.set(keys::THEME, theme) {
            warn!(error = %err, "failed to mirror theme to storage");
        }
    }

    /// Hand the open document to a renderer. The renderer receives its own
    /// deep copy and cannot reach back into engine state.
    pub fn render_current(
        &self,
        renderer: &dyn DocumentRenderer,
    ) -> Option<Result<Vec<u8>, RenderError>> {
        let doc = self.state.current.as_ref()?.doc.clone();
        Some(renderer.render(doc))
    }

    fn mirror_templates(&mut self) {
        match codec::templates_to_json(&self.state.templates) {
            Ok(text) => {
                if let Err(err) = self.store.set(keys::TEMPLATES, &text) {
                    warn!(error = %err, "failed to mirror template list to storage");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize template list"),
        }
    }

    fn mirror_current_id(&mut self) {
        let result = match self.state.current.as_ref() {
            Some(template) => self.store.set(keys::CURRENT_TEMPLATE_ID, &template.id),
            None => self.store.remove(keys::CURRENT_TEMPLATE_ID),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to mirror current template id to storage");
        }
    }

    fn mirror_document(&mut self) {
        let Some(template) = self.state.current.as_ref() else {
            return;
        };
        let value = codec::to_stored(&template.doc);
        match serde_json::to_string(&value) {
            Ok(text) => {
                if let Err(err) = self.store.set(keys::LEGACY_DOCUMENT, &text) {
                    warn!(error = %err, "failed to autosave document to storage");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize document for autosave"),
        }
    }
}

fn blank_template(taken: &HashSet<String>) -> Template {
    Template::new(ids::allocate_id(taken), UNTITLED_NAME)
}

fn known_ids(state: &AppState) -> HashSet<String> {
    state
        .templates
        .iter()
        .map(|t| t.id.clone())
        .chain(state.current.iter().map(|t| t.id.clone()))
        .collect()
}
