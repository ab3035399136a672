//! Mutation surface for the diagram
//!
//! [`Diagram`] owns the authoritative entity and relationship sets and is
//! the only place they change. Every operation runs to completion before
//! the next user event is processed; there is no background mutation.

use rand::Rng;
use tracing::{debug, warn};

use crate::core::compiler::{self, Schema};
use crate::core::ids::IdAllocator;
use crate::core::model::{
    sort_primary_key_first, Attribute, Cardinality, Entity, Position, Relationship,
    RelationshipType,
};
use crate::core::validation::{validate_entity, ValidationError};

/// New-entity canvas positions are scattered over this square.
const INITIAL_POSITION_SPREAD: f64 = 300.0;

/// Entity payload coming from a form: no id yet when creating, the stored
/// id when editing.
#[derive(Clone, Debug)]
pub struct EntityDraft {
    pub id: Option<String>,
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Explicit placement; a fresh random position is assigned when absent.
    pub position: Option<Position>,
}

impl EntityDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            attributes: Vec::new(),
            position: None,
        }
    }

    pub fn editing(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Relationship payload from the relationship dialog.
#[derive(Clone, Debug)]
pub struct RelationshipDraft {
    pub id: Option<String>,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub relationship_type: RelationshipType,
}

/// Why a proposed or submitted connection was rejected. The relationship
/// set is left untouched in every case.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Drag ended on the node it started from; silently dropped.
    #[error("An entity cannot relate to itself")]
    SelfReference,
    /// Order-independent duplicate; surfaced to the user as a conflict.
    #[error("Relationship between these tables already exists")]
    AlreadyConnected,
    /// Edit form referenced a relationship that no longer exists.
    #[error("Unknown relationship '{id}'")]
    UnknownRelationship { id: String },
}

/// The authoritative domain model of one editing session.
#[derive(Debug, Default)]
pub struct Diagram {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    ids: IdAllocator,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Create or update an entity from a form submission.
    ///
    /// Creation allocates a fresh id and, unless the draft carries one, a
    /// one-shot random canvas position. Updates keep the stored id and
    /// position verbatim. Attributes end up primary-key-first either way.
    pub fn save_entity(&mut self, draft: EntityDraft) -> Result<&Entity, ValidationError> {
        let editing_id = draft.id.as_deref();
        validate_entity(&draft.name, &draft.attributes, &self.entities, editing_id)?;

        let mut attributes = draft.attributes;
        sort_primary_key_first(&mut attributes);
        let name = draft.name.trim().to_string();

        if let Some(id) = &draft.id {
            if let Some(index) = self.entities.iter().position(|e| &e.id == id) {
                let entity = &mut self.entities[index];
                entity.name = name;
                entity.attributes = attributes;
                debug!(entity_id = %entity.id, "entity updated");
                return Ok(&self.entities[index]);
            }
            // Stale edit form for a deleted entity; fall through to a
            // fresh create so the user's work is not lost.
        }

        self.insert_entity(name, attributes, draft.position)
    }

    fn insert_entity(
        &mut self,
        name: String,
        attributes: Vec<Attribute>,
        position: Option<Position>,
    ) -> Result<&Entity, ValidationError> {
        let id = self.ids.next_entity_id();
        let position = position.unwrap_or_else(|| {
            let mut rng = rand::thread_rng();
            Position::new(
                rng.gen_range(0.0..INITIAL_POSITION_SPREAD),
                rng.gen_range(0.0..INITIAL_POSITION_SPREAD),
            )
        });
        debug!(entity_id = %id, name = %name, "entity created");
        self.entities.push(Entity {
            id,
            name,
            attributes,
            position,
        });
        Ok(self.entities.last().expect("just pushed"))
    }

    /// Delete an entity and, in the same call, every relationship that
    /// references it. The cascade runs before any projection can observe
    /// the model, so no visual edge ever points at a missing node.
    pub fn delete_entity(&mut self, id: &str) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        if self.entities.len() == before {
            return false;
        }
        let rels_before = self.relationships.len();
        self.relationships.retain(|r| !r.involves(id));
        debug!(
            entity_id = %id,
            cascaded = rels_before - self.relationships.len(),
            "entity deleted"
        );
        true
    }

    /// Resolve a drag gesture from one node to another into a relationship.
    ///
    /// New connections default to one-to-many with the drag-origin side as
    /// the "one" endpoint (child references parent); the user can change
    /// the type afterwards through the relationship dialog.
    pub fn propose_connection(
        &mut self,
        source: &str,
        target: &str,
        drag_origin: &str,
    ) -> Result<&Relationship, ConnectionError> {
        if source == target {
            return Err(ConnectionError::SelfReference);
        }
        if self.relationships.iter().any(|r| r.connects(source, target)) {
            warn!(source, target, "duplicate connection rejected");
            return Err(ConnectionError::AlreadyConnected);
        }

        let origin_is_source = drag_origin == source;
        let relationship = Relationship {
            id: self.ids.next_relationship_id(),
            source_entity_id: source.to_string(),
            target_entity_id: target.to_string(),
            relationship_type: RelationshipType::OneToMany,
            source_cardinality: if origin_is_source {
                Cardinality::One
            } else {
                Cardinality::Many
            },
            target_cardinality: if origin_is_source {
                Cardinality::Many
            } else {
                Cardinality::One
            },
        };
        debug!(relationship_id = %relationship.id, "connection accepted");
        self.relationships.push(relationship);
        Ok(self.relationships.last().expect("just pushed"))
    }

    /// Create or update a relationship from the dialog form. The same
    /// self-reference and duplicate-pair rules apply as for drag gestures.
    pub fn save_relationship(
        &mut self,
        draft: RelationshipDraft,
    ) -> Result<&Relationship, ConnectionError> {
        if draft.source_entity_id == draft.target_entity_id {
            return Err(ConnectionError::SelfReference);
        }
        let duplicate = self.relationships.iter().any(|r| {
            r.connects(&draft.source_entity_id, &draft.target_entity_id)
                && draft.id.as_deref() != Some(r.id.as_str())
        });
        if duplicate {
            return Err(ConnectionError::AlreadyConnected);
        }

        if let Some(id) = draft.id {
            let index = self
                .relationships
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| ConnectionError::UnknownRelationship { id: id.clone() })?;
            let rel = &mut self.relationships[index];
            rel.source_entity_id = draft.source_entity_id;
            rel.target_entity_id = draft.target_entity_id;
            rel.relationship_type = draft.relationship_type;
            if let Some((s, t)) = draft.relationship_type.forced_cardinalities() {
                rel.source_cardinality = s;
                rel.target_cardinality = t;
            }
            debug!(relationship_id = %rel.id, "relationship updated");
            return Ok(&self.relationships[index]);
        }

        let (source_cardinality, target_cardinality) = draft
            .relationship_type
            .forced_cardinalities()
            .unwrap_or((Cardinality::One, Cardinality::Many));
        let relationship = Relationship {
            id: self.ids.next_relationship_id(),
            source_entity_id: draft.source_entity_id,
            target_entity_id: draft.target_entity_id,
            relationship_type: draft.relationship_type,
            source_cardinality,
            target_cardinality,
        };
        debug!(relationship_id = %relationship.id, "relationship created");
        self.relationships.push(relationship);
        Ok(self.relationships.last().expect("just pushed"))
    }

    pub fn delete_relationship(&mut self, id: &str) -> bool {
        let before = self.relationships.len();
        self.relationships.retain(|r| r.id != id);
        let removed = self.relationships.len() < before;
        if removed {
            debug!(relationship_id = %id, "relationship deleted");
        }
        removed
    }

    /// Compile the current model snapshot into an immutable [`Schema`].
    pub fn compile(&self) -> Schema {
        compiler::compile(&self.entities, &self.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AttributeType;
    use crate::core::validation::ValidationError;

    fn draft(name: &str) -> EntityDraft {
        EntityDraft::new(name)
            .with_attribute(Attribute::new("id", AttributeType::Integer).primary_key().unique())
    }

    fn diagram_with(names: &[&str]) -> (Diagram, Vec<String>) {
        let mut diagram = Diagram::new();
        let ids = names
            .iter()
            .map(|n| diagram.save_entity(draft(n)).unwrap().id.clone())
            .collect();
        (diagram, ids)
    }

    #[test]
    fn test_save_entity_allocates_id_and_position() {
        let mut diagram = Diagram::new();
        let entity = diagram.save_entity(draft("customers")).unwrap();
        assert_eq!(entity.id, "entity-0");
        assert!(entity.position.x >= 0.0 && entity.position.x < INITIAL_POSITION_SPREAD);
        assert!(entity.position.y >= 0.0 && entity.position.y < INITIAL_POSITION_SPREAD);
    }

    #[test]
    fn test_save_entity_rejects_invalid_draft() {
        let mut diagram = Diagram::new();
        let no_pk = EntityDraft::new("customers")
            .with_attribute(Attribute::new("name", AttributeType::Text));
        assert_eq!(
            diagram.save_entity(no_pk).unwrap_err(),
            ValidationError::MissingPrimaryKey
        );
        assert!(diagram.entities().is_empty());
    }

    #[test]
    fn test_update_preserves_id_and_position() {
        let (mut diagram, ids) = diagram_with(&["customers"]);
        let original = diagram.entity(&ids[0]).unwrap().position;

        let updated = diagram
            .save_entity(draft("clients").editing(&ids[0]))
            .unwrap();
        assert_eq!(updated.id, ids[0]);
        assert_eq!(updated.name, "clients");
        assert_eq!(updated.position, original);
        assert_eq!(diagram.entities().len(), 1);
    }

    #[test]
    fn test_update_keeps_name_under_edit_exclusion() {
        let (mut diagram, ids) = diagram_with(&["customers"]);
        // Re-saving under its own name must not count as a collision.
        assert!(diagram.save_entity(draft("customers").editing(&ids[0])).is_ok());
    }

    #[test]
    fn test_delete_entity_cascades_relationships() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders", "products"]);
        diagram.propose_connection(&ids[1], &ids[0], &ids[1]).unwrap();
        diagram.propose_connection(&ids[1], &ids[2], &ids[1]).unwrap();
        assert_eq!(diagram.relationships().len(), 2);

        assert!(diagram.delete_entity(&ids[1]));
        assert!(diagram.relationships().is_empty());
        assert_eq!(diagram.entities().len(), 2);

        // Deleting again is a no-op.
        assert!(!diagram.delete_entity(&ids[1]));
    }

    #[test]
    fn test_deleted_entity_never_appears_in_compile() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        diagram.propose_connection(&ids[1], &ids[0], &ids[1]).unwrap();
        diagram.delete_entity(&ids[0]);

        let schema = diagram.compile();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(!json.contains(&ids[0]));
    }

    #[test]
    fn test_propose_connection_cardinality_follows_drag_origin() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);

        let rel = diagram
            .propose_connection(&ids[0], &ids[1], &ids[0])
            .unwrap();
        assert_eq!(rel.relationship_type, RelationshipType::OneToMany);
        assert_eq!(rel.source_cardinality, Cardinality::One);
        assert_eq!(rel.target_cardinality, Cardinality::Many);
    }

    #[test]
    fn test_propose_connection_reversed_drag_origin() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);

        let rel = diagram
            .propose_connection(&ids[0], &ids[1], &ids[1])
            .unwrap();
        assert_eq!(rel.source_cardinality, Cardinality::Many);
        assert_eq!(rel.target_cardinality, Cardinality::One);
    }

    #[test]
    fn test_self_connection_rejected() {
        let (mut diagram, ids) = diagram_with(&["customers"]);
        assert_eq!(
            diagram.propose_connection(&ids[0], &ids[0], &ids[0]),
            Err(ConnectionError::SelfReference)
        );
        assert!(diagram.relationships().is_empty());
    }

    #[test]
    fn test_duplicate_connection_rejected_in_both_directions() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        diagram.propose_connection(&ids[0], &ids[1], &ids[0]).unwrap();

        assert_eq!(
            diagram.propose_connection(&ids[0], &ids[1], &ids[0]),
            Err(ConnectionError::AlreadyConnected)
        );
        assert_eq!(
            diagram.propose_connection(&ids[1], &ids[0], &ids[1]),
            Err(ConnectionError::AlreadyConnected)
        );
        assert_eq!(diagram.relationships().len(), 1);
    }

    #[test]
    fn test_save_relationship_forces_cardinalities_for_symmetric_types() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        let rel_id = diagram
            .propose_connection(&ids[0], &ids[1], &ids[1])
            .unwrap()
            .id
            .clone();

        // Switching the type through the dialog overrides the stored pair.
        let updated = diagram
            .save_relationship(RelationshipDraft {
                id: Some(rel_id),
                source_entity_id: ids[0].clone(),
                target_entity_id: ids[1].clone(),
                relationship_type: RelationshipType::ManyToMany,
            })
            .unwrap();
        assert_eq!(updated.source_cardinality, Cardinality::Many);
        assert_eq!(updated.target_cardinality, Cardinality::Many);
    }

    #[test]
    fn test_save_relationship_create_defaults_one_to_many() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        let rel = diagram
            .save_relationship(RelationshipDraft {
                id: None,
                source_entity_id: ids[0].clone(),
                target_entity_id: ids[1].clone(),
                relationship_type: RelationshipType::OneToMany,
            })
            .unwrap();
        assert_eq!(rel.source_cardinality, Cardinality::One);
        assert_eq!(rel.target_cardinality, Cardinality::Many);
    }

    #[test]
    fn test_save_relationship_unknown_id() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        let result = diagram.save_relationship(RelationshipDraft {
            id: Some("rel-99".into()),
            source_entity_id: ids[0].clone(),
            target_entity_id: ids[1].clone(),
            relationship_type: RelationshipType::OneToOne,
        });
        assert_eq!(
            result,
            Err(ConnectionError::UnknownRelationship { id: "rel-99".into() })
        );
    }

    #[test]
    fn test_delete_relationship() {
        let (mut diagram, ids) = diagram_with(&["customers", "orders"]);
        let rel_id = diagram
            .propose_connection(&ids[0], &ids[1], &ids[0])
            .unwrap()
            .id
            .clone();

        assert!(diagram.delete_relationship(&rel_id));
        assert!(!diagram.delete_relationship(&rel_id));
        assert!(diagram.relationships().is_empty());
    }
}
