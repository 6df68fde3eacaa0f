//! Diagnostic types for error reporting.

mod error;
mod span;

pub use error::{PlanError, Warning, WarningKind};
pub use span::Location;
