// ABOUTME: Task definition revision drafting.
// ABOUTME: Turns a described definition plus an image target into a registration request.

mod draft;
mod error;

pub use draft::TaskDefinitionDraft;
pub use error::BuildError;
