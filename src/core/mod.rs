mod engine;
mod error;
mod types;

pub use engine::project;
pub use error::{ProjectionError, ValidationError};
pub use types::{MAX_AGE, MAX_AGE_NOTE, ProjectionInput, YearRecord};
