//! Construction Phase
//!
//! Resources are declared into a [`GraphBuilder`], which records nodes and
//! dependency edges into an arena. `GraphBuilder::validate()` runs the
//! [`ConstructionValidator`] and seals the result into a `ValidatedGraph`,
//! the only form the submission phase accepts.

pub mod builder;
pub mod validator;

pub use builder::{DeclaredResource, Export, GraphBuilder, ResourceOptions, ResourceSpec};
pub use validator::ConstructionValidator;
