// ABOUTME: Error type for building task definition revisions.
// ABOUTME: Raised when the described definition cannot be projected.

/// Errors building a new revision from an existing definition.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The described definition is not usable as a registration source.
    #[error("invalid task definition document: {0}")]
    InvalidSourceDocument(String),
}
