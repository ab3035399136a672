//! Domain model: entities (tables), attributes (columns) and relationships
//!
//! These structs are the single source of truth for the editor. The visual
//! graph (`core::graph`) and the compiled schema (`core::compiler`) are both
//! derived from them and never hold authoritative state.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::types::AttributeType;

/// Canvas position of an entity. Presentation-only: assigned once when the
/// entity is created and passed through unchanged by every other layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A table column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: AttributeType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub is_primary_key: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            data_type,
            length: None,
            precision: None,
            scale: None,
            is_primary_key: false,
            is_nullable: true,
            is_unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// Fully-qualified type string: `VARCHAR(50)`, `DECIMAL(10,2)`,
    /// `DECIMAL(10)`, or the bare type name when no figure is set or the
    /// type takes none.
    pub fn formatted_type(&self) -> String {
        if self.data_type.supports_length() {
            if let Some(length) = self.length {
                return format!("{}({})", self.data_type, length);
            }
        } else if self.data_type.supports_precision() {
            match (self.precision, self.scale) {
                (Some(p), Some(s)) => return format!("{}({},{})", self.data_type, p, s),
                (Some(p), None) => return format!("{}({})", self.data_type, p),
                _ => {}
            }
        }
        self.data_type.to_string()
    }
}

/// A modeled database table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Allocated once at creation; immutable thereafter.
    pub id: String,
    pub name: String,
    /// Primary-key attribute first, insertion order otherwise.
    pub attributes: Vec<Attribute>,
    pub position: Position,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn add_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        sort_primary_key_first(&mut self.attributes);
        self
    }

    /// The primary-key attribute, if one has been defined yet.
    pub fn primary_key(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is_primary_key)
    }

    /// Case-insensitive lookup by column name.
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Stable re-order: primary-key attribute(s) float to the front, everything
/// else keeps its insertion order.
pub(crate) fn sort_primary_key_first(attributes: &mut [Attribute]) {
    attributes.sort_by_key(|a| !a.is_primary_key);
}

/// Whether an endpoint of a relationship stands for one row or many.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[display("one")]
    One,
    #[display("many")]
    Many,
}

/// Relationship type between two tables.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipType {
    #[display("1:1")]
    #[serde(rename = "one-to-one")]
    OneToOne,
    #[display("1:N")]
    #[serde(rename = "one-to-many")]
    OneToMany,
    #[display("N:M")]
    #[serde(rename = "many-to-many")]
    ManyToMany,
}

impl RelationshipType {
    /// Cardinality pair forced by the type, or `None` for one-to-many where
    /// the pair depends on which side the user dragged from.
    pub fn forced_cardinalities(self) -> Option<(Cardinality, Cardinality)> {
        match self {
            RelationshipType::OneToOne => Some((Cardinality::One, Cardinality::One)),
            RelationshipType::ManyToMany => Some((Cardinality::Many, Cardinality::Many)),
            RelationshipType::OneToMany => None,
        }
    }
}

/// A typed, directed association between two entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source_entity_id: String,
    pub target_entity_id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source_cardinality: Cardinality,
    pub target_cardinality: Cardinality,
}

impl Relationship {
    /// True when this relationship connects `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_entity_id == a && self.target_entity_id == b)
            || (self.source_entity_id == b && self.target_entity_id == a)
    }

    /// True when `entity_id` is either endpoint.
    pub fn involves(&self, entity_id: &str) -> bool {
        self.source_entity_id == entity_id || self.target_entity_id == entity_id
    }
}
