pub mod ids;
pub mod interchange;
pub mod registry;
pub mod renderer;
pub mod store;

pub use ids::{allocate_id, generate_unique_name};
pub use interchange::{import_many, normalize_for_import, parse_import, ExportError, ImportError};
pub use registry::TemplateWorkspace;
pub use renderer::{DocumentRenderer, RenderError};
pub use store::{JsonFileStore, MemoryStore, StoreError, TextStore};

// Re-export the state and mutation types the registry operates on
pub use pagecraft_editor::{AppState, Mutation, MutationError, Template};
