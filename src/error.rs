use thiserror::Error;

pub type Result<T, E = CanvasError> = std::result::Result<T, E>;

/// Failures that leave the core. Everything else in the editor is total and
/// degrades to a no-op instead of erroring.
#[derive(Error, Debug)]
pub enum CanvasError {
    /// A node with this id is already part of the graph.
    #[error("a node with id '{id}' already exists")]
    DuplicateId { id: String },

    /// Imported data was unreadable or did not describe a well-formed graph.
    #[error("malformed import: {0}")]
    MalformedImport(String),

    /// A config file was unreadable or held out-of-range values.
    #[error("invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write SVG output")]
    Render(#[from] std::fmt::Error),
}

impl CanvasError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        CanvasError::MalformedImport(reason.into())
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(err: serde_json::Error) -> Self {
        CanvasError::MalformedImport(err.to_string())
    }
}
