//! Editor application state.
//!
//! One [`AppState`] value is the whole editing world: the saved template
//! registry, the currently open template, selection, and the dirty flag.
//! State values are immutable by convention; the mutation reducer and the
//! registry always return fresh snapshots, so previous values stay valid.

use pagecraft_document::Template;

/// Snapshot of the editor's state.
///
/// `dirty` is true iff the current template's document (or name) has
/// diverged from what `templates` records for its id since the last save.
/// It is cleared exactly on save, on switching template, and on load.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// The template open in the editor. Its id may not yet exist in
    /// `templates` (a fresh, never-saved document).
    pub current: Option<Template>,

    /// The saved registry.
    pub templates: Vec<Template>,

    /// Index of the selected content node, if any.
    pub selected_index: Option<usize>,

    pub dirty: bool,

    /// Output filename handed to the renderer on export.
    pub filename: String,

    pub preview_mode: bool,
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current: None,
            templates: Vec::new(),
            selected_index: None,
            dirty: false,
            filename: "document.pdf".to_string(),
            preview_mode: false,
            loading: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the currently open template.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|template| template.id.as_str())
    }

    pub fn find_template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Select a content node (a plain UI setter; not a tracked mutation).
    pub fn select_item(&mut self, index: Option<usize>) {
        self.selected_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_clean() {
        let state = AppState::new();
        assert!(state.current.is_none());
        assert!(state.templates.is_empty());
        assert!(!state.dirty);
        assert_eq!(state.filename, "document.pdf");
    }

    #[test]
    fn current_id_tracks_current_template() {
        let mut state = AppState::new();
        assert_eq!(state.current_id(), None);

        state.current = Some(Template::new("tpl-9", "Report"));
        assert_eq!(state.current_id(), Some("tpl-9"));
    }
}
