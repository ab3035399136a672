//! Schema compilation
//!
//! Flattens the current {entities, relationships} snapshot into the JSON
//! payload consumed by the downstream SQL generator. The serialized field
//! names are a wire contract and must not change.
//!
//! The compiler is total: it never fails on a structurally incomplete
//! model. Completeness (exactly one primary key, legal names) is enforced
//! at save time, and a relationship endpoint missing from the entity set is
//! recorded as an absent table name rather than an error.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::model::{Attribute, Cardinality, Entity, Relationship, RelationshipType};

/// Compiled, immutable description of the whole model. Produced fresh on
/// every compile; never merged with a previous version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub tables: Vec<SchemaTable>,
    pub relationships: Vec<SchemaRelationship>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTable {
    pub id: String,
    pub name: String,
    pub fields: Vec<SchemaField>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    /// Fully-qualified type string, e.g. `VARCHAR(50)` or `DECIMAL(10,2)`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Bare type name without length/precision suffix.
    pub primitive_type: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub primary_key: bool,
    pub unique: bool,
    pub nullable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRelationship {
    pub id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub source_entity_id: String,
    pub target_entity_id: String,
    /// `None` when the source entity id is dangling.
    pub source_table_name: Option<String>,
    /// `None` when the target entity id is dangling.
    pub target_table_name: Option<String>,
    pub source_cardinality: Cardinality,
    pub target_cardinality: Cardinality,
}

impl SchemaField {
    fn from_attribute(attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            type_name: attribute.formatted_type(),
            primitive_type: attribute.data_type.to_string(),
            length: attribute.length,
            precision: attribute.precision,
            scale: attribute.scale,
            primary_key: attribute.is_primary_key,
            unique: attribute.is_unique,
            nullable: attribute.is_nullable,
        }
    }
}

/// Compile the model into a [`Schema`].
///
/// Table order follows the entity set, relationship order the relationship
/// set; no sorting or deduplication happens here, so compiling the same
/// input twice yields byte-identical output.
pub fn compile(entities: &[Entity], relationships: &[Relationship]) -> Schema {
    let tables = entities
        .iter()
        .map(|entity| SchemaTable {
            id: entity.id.clone(),
            name: entity.name.clone(),
            fields: compile_fields(entity, entities, relationships),
        })
        .collect::<Vec<_>>();

    let compiled_relationships = relationships
        .iter()
        .map(|rel| {
            let (source_cardinality, target_cardinality) = rel
                .relationship_type
                .forced_cardinalities()
                .unwrap_or((rel.source_cardinality, rel.target_cardinality));
            SchemaRelationship {
                id: rel.id.clone(),
                relationship_type: rel.relationship_type,
                source_entity_id: rel.source_entity_id.clone(),
                target_entity_id: rel.target_entity_id.clone(),
                source_table_name: lookup_name(entities, &rel.source_entity_id),
                target_table_name: lookup_name(entities, &rel.target_entity_id),
                source_cardinality,
                target_cardinality,
            }
        })
        .collect::<Vec<_>>();

    info!(
        tables = tables.len(),
        relationships = compiled_relationships.len(),
        "schema compiled"
    );
    Schema {
        tables,
        relationships: compiled_relationships,
    }
}

fn lookup_name(entities: &[Entity], id: &str) -> Option<String> {
    entities.iter().find(|e| e.id == id).map(|e| e.name.clone())
}

/// An entity's own attributes, followed by the foreign-key fields its
/// incoming relationships synthesize.
fn compile_fields(
    entity: &Entity,
    entities: &[Entity],
    relationships: &[Relationship],
) -> Vec<SchemaField> {
    let mut fields: Vec<SchemaField> = entity
        .attributes
        .iter()
        .map(SchemaField::from_attribute)
        .collect();

    for rel in relationships {
        // The foreign key lands on the target entity, except for
        // many-to-many where both endpoints reference each other.
        let holds_foreign_key = match rel.relationship_type {
            RelationshipType::OneToOne | RelationshipType::OneToMany => {
                rel.target_entity_id == entity.id
            }
            RelationshipType::ManyToMany => rel.involves(&entity.id),
        };
        if !holds_foreign_key {
            continue;
        }

        let referenced_id = if rel.source_entity_id == entity.id {
            &rel.target_entity_id
        } else {
            &rel.source_entity_id
        };
        // Dangling endpoints and key-less referenced tables produce no
        // synthetic field; compilation carries on regardless.
        let Some(referenced) = entities.iter().find(|e| &e.id == referenced_id) else {
            continue;
        };
        let Some(referenced_key) = referenced.primary_key() else {
            continue;
        };

        let field_name = format!(
            "{}_{}",
            referenced.name.to_lowercase(),
            referenced_key.name
        );
        if fields.iter().any(|f| f.name.eq_ignore_ascii_case(&field_name)) {
            continue;
        }
        fields.push(SchemaField {
            name: field_name,
            type_name: referenced_key.formatted_type(),
            primitive_type: referenced_key.data_type.to_string(),
            length: referenced_key.length,
            precision: referenced_key.precision,
            scale: referenced_key.scale,
            primary_key: false,
            unique: false,
            nullable: true,
        });
    }

    fields
}
