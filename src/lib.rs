//! Schemaforge - Entity-Relationship Modeling Core
//!
//! The domain model behind a visual database schema editor: entities
//! (tables), attributes (columns) and typed relationships, the rules that
//! keep a user-edited diagram consistent, and the compiler that flattens
//! the model into the schema JSON a downstream SQL generator consumes.
//!
//! The presentation layer (canvas, dialogs, HTTP) lives outside this
//! crate and drives it through [`core::Diagram`] and [`core::project`].

pub mod core;

pub use crate::core::{compile, project, Diagram, Schema};
