//! Renderer boundary.
//!
//! Producing bytes from a finished document (pagination, fonts, PDF
//! assembly) is an external collaborator's job. The engine only defines the
//! seam and guarantees the renderer works on its own deep copy, so it can
//! never mutate engine state as a side effect.

use thiserror::Error;

use pagecraft_document::DocumentModel;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer failed: {0}")]
    Failed(String),
}

pub trait DocumentRenderer {
    /// Render a fully-resolved document to an output byte stream.
    fn render(&self, doc: DocumentModel) -> Result<Vec<u8>, RenderError>;
}
