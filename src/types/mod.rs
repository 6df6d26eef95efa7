// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to keep revision and task ARNs apart at compile time.

mod id;
mod image_ref;
mod service_name;

pub use id::{Arn, RevisionArn, TaskArn};
pub use image_ref::{DEFAULT_TAG, ImageRef, ImageTarget, ParseImageRefError, strip_tag};
pub use service_name::{ServiceName, ServiceNameError};
