//! Core domain model and schema compilation

pub mod codegen;
pub mod compiler;
pub mod editor;
pub mod graph;
pub mod ids;
pub mod model;
pub mod types;
pub mod validation;

pub use codegen::{
    ConnectionParameters, ExecuteSqlRequest, GenerationTracker, LogLevel, LogMessage, SessionLog,
};
pub use compiler::{compile, Schema, SchemaField, SchemaRelationship, SchemaTable};
pub use editor::{ConnectionError, Diagram, EntityDraft, RelationshipDraft};
pub use graph::{project, DiagramGraph, DiagramHandlers, VisualEdge, VisualNode};
pub use ids::IdAllocator;
pub use model::{Attribute, Cardinality, Entity, Position, Relationship, RelationshipType};
pub use types::{AttributeType, DEFAULT_ATTRIBUTE_TYPE};
pub use validation::{
    validate_attribute, validate_attribute_name, validate_entity, validate_entity_name,
    ValidationError,
};
