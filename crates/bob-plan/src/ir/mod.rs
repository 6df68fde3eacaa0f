//! The build model produced by the descriptor frontend and consumed by the
//! plan generators.
//!
//! A [`Rule`] is one compile unit; a [`Descriptor`] is every rule of a single
//! directory plus the target-group and source indices built from them.

mod descriptor;
mod rule;

pub use descriptor::Descriptor;
pub use rule::{DirContext, Rule, DIR_VAR};
