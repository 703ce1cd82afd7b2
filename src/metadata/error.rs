/// Errors that can occur while assembling metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Two elements were registered under the same identifier
    #[error("duplicate element identifier: {0}")]
    DuplicateElement(String),

    /// An element builder was finalized before a required field was set
    #[error("incomplete element description: missing {0}")]
    IncompleteElement(&'static str),

    /// A recording description failed validation
    #[error("invalid recording description: {0}")]
    InvalidRecording(String),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}
