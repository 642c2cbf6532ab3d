//! Registry lifecycle tests

use pagecraft_workspace::{
    JsonFileStore, MemoryStore, Mutation, TemplateWorkspace, TextStore,
};
use serde_json::json;

fn memory_workspace() -> TemplateWorkspace {
    TemplateWorkspace::new(Box::new(MemoryStore::new()))
}

fn add_paragraph(workspace: &mut TemplateWorkspace, value: &str) {
    workspace
        .apply(&Mutation::AddParagraph {
            index: None,
            value: value.to_string(),
        })
        .expect("mutation applies");
}

#[test]
fn fresh_workspace_opens_an_untitled_template() {
    let workspace = memory_workspace();
    let state = workspace.state();

    assert!(state.templates.is_empty());
    assert!(!state.dirty);
    let current = workspace.current().expect("current template");
    assert_eq!(current.name, "Untitled Template");
    assert!(current.doc.content.is_empty());
}

#[test]
fn mutations_set_dirty_and_save_clears_it() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "hello");
    assert!(workspace.state().dirty);

    workspace.save();
    assert!(!workspace.state().dirty);
    assert_eq!(workspace.templates().len(), 1);
}

#[test]
fn save_is_idempotent() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "hello");

    workspace.save();
    let after_first = workspace.templates().to_vec();

    workspace.save();
    assert_eq!(workspace.templates(), after_first.as_slice());
}

#[test]
fn save_replaces_by_id_rather_than_appending() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "v1");
    workspace.save();

    add_paragraph(&mut workspace, "v2");
    workspace.save();

    assert_eq!(workspace.templates().len(), 1);
    assert_eq!(
        workspace.templates()[0].doc.content,
        vec![json!("v1"), json!("v2")]
    );
}

#[test]
fn select_switches_template_and_resets_flags() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "first");
    workspace.save();
    let first_id = workspace.current().expect("current").id.clone();

    workspace.new_template();
    add_paragraph(&mut workspace, "second");
    workspace.save();

    workspace.select_item(Some(0));
    add_paragraph(&mut workspace, "unsaved edit");
    assert!(workspace.state().dirty);

    workspace.select_template(&first_id);
    let state = workspace.state();
    assert!(!state.dirty);
    assert_eq!(state.selected_index, None);
    assert_eq!(state.current_id(), Some(first_id.as_str()));
    assert_eq!(
        workspace.current().expect("current").doc.content,
        vec![json!("first")]
    );
}

#[test]
fn select_with_unknown_id_is_a_no_op() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "keep me");
    let before_id = workspace.current().expect("current").id.clone();

    workspace.select_template("tpl-ghost");
    assert_eq!(workspace.state().current_id(), Some(before_id.as_str()));
    // The open (dirty) document is untouched.
    assert!(workspace.state().dirty);
}

#[test]
fn deleting_current_falls_back_to_first_remaining() {
    let mut workspace = memory_workspace();
    workspace.save();
    let first_id = workspace.current().expect("current").id.clone();

    workspace.new_template();
    workspace.save();
    let second_id = workspace.current().expect("current").id.clone();
    assert_ne!(first_id, second_id);

    workspace.delete_template(&second_id);
    assert_eq!(workspace.state().current_id(), Some(first_id.as_str()));
    assert!(!workspace.state().dirty);
    assert_eq!(workspace.templates().len(), 1);
}

#[test]
fn deleting_the_last_template_leaves_no_current() {
    let mut workspace = memory_workspace();
    workspace.save();
    let id = workspace.current().expect("current").id.clone();

    workspace.delete_template(&id);
    assert!(workspace.current().is_none());
    assert!(workspace.templates().is_empty());
}

#[test]
fn delete_with_unknown_id_is_a_no_op() {
    let mut workspace = memory_workspace();
    workspace.save();
    let before = workspace.templates().to_vec();

    workspace.delete_template("tpl-ghost");
    assert_eq!(workspace.templates(), before.as_slice());
}

#[test]
fn duplicate_deep_copies_the_document() {
    let mut workspace = memory_workspace();
    add_paragraph(&mut workspace, "original body");
    workspace.rename_current("Invoice");
    workspace.save();
    let source_id = workspace.current().expect("current").id.clone();

    let copy_id = workspace.duplicate(&source_id).expect("duplicate succeeds");
    assert_ne!(copy_id, source_id);

    let copy = workspace.current().expect("copy is current");
    assert_eq!(copy.id, copy_id);
    assert_eq!(copy.name, "Copy of Invoice");
    assert_eq!(copy.doc.content, vec![json!("original body")]);
    assert!(!workspace.state().dirty);

    // Editing the copy must not leak into the source.
    add_paragraph(&mut workspace, "copy-only edit");
    workspace.save();
    let source = workspace
        .templates()
        .iter()
        .find(|t| t.id == source_id)
        .expect("source still registered");
    assert_eq!(source.doc.content, vec![json!("original body")]);
}

#[test]
fn duplicate_names_avoid_collisions() {
    let mut workspace = memory_workspace();
    workspace.rename_current("Invoice");
    workspace.save();
    let source_id = workspace.current().expect("current").id.clone();

    workspace.duplicate(&source_id);
    workspace.duplicate(&source_id);

    let names: Vec<&str> = workspace.templates().iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Copy of Invoice"));
    assert!(names.contains(&"Copy of Invoice 2"));
}

#[test]
fn rename_marks_dirty_until_saved() {
    let mut workspace = memory_workspace();
    workspace.save();
    assert!(!workspace.state().dirty);

    workspace.rename_current("Quarterly Report");
    assert!(workspace.state().dirty);

    workspace.save();
    assert!(!workspace.state().dirty);
    assert_eq!(workspace.templates()[0].name, "Quarterly Report");
}

#[test]
fn state_survives_a_store_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("workspace.json");

    let saved_id = {
        let store = JsonFileStore::open(&path).expect("store opens");
        let mut workspace = TemplateWorkspace::new(Box::new(store));
        add_paragraph(&mut workspace, "persisted");
        workspace.rename_current("Kept");
        workspace.save();
        workspace.set_filename("kept.pdf");
        workspace.current().expect("current").id.clone()
    };

    let store = JsonFileStore::open(&path).expect("store reopens");
    let workspace = TemplateWorkspace::load(Box::new(store));
    let state = workspace.state();

    assert_eq!(state.current_id(), Some(saved_id.as_str()));
    assert_eq!(state.filename, "kept.pdf");
    assert!(!state.dirty);
    let current = workspace.current().expect("current restored");
    assert_eq!(current.name, "Kept");
    assert_eq!(current.doc.content, vec![json!("persisted")]);
}

#[test]
fn load_falls_back_to_legacy_single_document() {
    let mut store = MemoryStore::new();
    store
        .set(
            "docDefinition",
            r#"{"content": ["legacy body"], "styles": {"h": {"bold": true}}}"#,
        )
        .expect("seed legacy key");

    let workspace = TemplateWorkspace::load(Box::new(store));
    assert_eq!(workspace.templates().len(), 1);
    let current = workspace.current().expect("legacy doc becomes current");
    assert_eq!(current.name, "Untitled Template");
    assert_eq!(current.doc.content, vec![json!("legacy body")]);
    assert_eq!(current.doc.styles.get("h"), Some(&json!({"bold": true})));
}

#[test]
fn load_prefers_template_list_over_legacy_key() {
    let mut store = MemoryStore::new();
    store
        .set(
            "templates",
            r#"[{"id": "tpl-list", "name": "From List", "docDefinition": {"content": []}}]"#,
        )
        .expect("seed list key");
    store
        .set("docDefinition", r#"{"content": ["legacy body"]}"#)
        .expect("seed legacy key");

    let workspace = TemplateWorkspace::load(Box::new(store));
    assert_eq!(workspace.templates().len(), 1);
    assert_eq!(workspace.templates()[0].id, "tpl-list");
}

#[test]
fn store_failures_do_not_block_mutations() {
    /// A store whose writes always fail.
    struct BrokenStore;

    impl TextStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, pagecraft_workspace::StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), pagecraft_workspace::StoreError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), pagecraft_workspace::StoreError> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    let mut workspace = TemplateWorkspace::new(Box::new(BrokenStore));
    add_paragraph(&mut workspace, "still lands in memory");
    workspace.save();

    assert_eq!(
        workspace.current().expect("current").doc.content,
        vec![json!("still lands in memory")]
    );
    assert_eq!(workspace.templates().len(), 1);
    assert!(!workspace.state().dirty);
}
