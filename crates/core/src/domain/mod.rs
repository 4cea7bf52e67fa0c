// Domain Layer - Outcome model produced by a single probe execution

pub mod outcome;
pub mod resolution;

// Re-exports
pub use outcome::{Details, Outcome, Status, ERROR_DETAIL_KEY};
pub use resolution::{Resolution, ResolutionCause};
