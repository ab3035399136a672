//! Visual graph projection
//!
//! The canvas never holds authoritative state: whenever the domain model
//! changes, the whole node/edge graph is rebuilt from it in one pass.
//! Full recompute instead of incremental patching rules out drift between
//! the model and what the user sees.

use std::collections::HashMap;

use petgraph::stable_graph::StableGraph;
use petgraph::Directed;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::model::{Attribute, Cardinality, Entity, Position, Relationship, RelationshipType};

/// Disposable rendering payload for one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    /// Id of the entity this node was projected from; the rendering layer
    /// passes it back through [`DiagramHandlers`] for edit/delete actions.
    pub entity_id: String,
    pub label: String,
    pub attributes: Vec<Attribute>,
    pub position: Position,
}

/// Disposable rendering payload for one relationship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEdge {
    pub relationship_id: String,
    pub relationship_type: RelationshipType,
    pub source_cardinality: Cardinality,
    pub target_cardinality: Cardinality,
}

/// The rendering layer's graph: nodes are tables, edges are relationships.
pub type DiagramGraph = StableGraph<VisualNode, VisualEdge, Directed>;

/// Action sink the rendering layer hands its gestures to.
///
/// Dispatch is by entity/relationship id looked up against the current
/// model, not by closures captured at projection time, so a stale
/// projection can never act on an entity that has since changed.
pub trait DiagramHandlers {
    fn edit_entity(&mut self, entity_id: &str);
    fn delete_entity(&mut self, entity_id: &str);
    fn edit_relationship(&mut self, relationship_id: &str);
    fn delete_relationship(&mut self, relationship_id: &str);
}

/// Project the domain model onto a fresh [`DiagramGraph`].
///
/// Pure function of its inputs: the same entities and relationships always
/// produce the same graph, in the same order. An edge whose endpoint has no
/// matching node (a transient state between a delete and the next sync) is
/// skipped rather than an error.
pub fn project(entities: &[Entity], relationships: &[Relationship]) -> DiagramGraph {
    let mut graph = DiagramGraph::with_capacity(entities.len(), relationships.len());
    let mut index_by_id = HashMap::with_capacity(entities.len());

    for entity in entities {
        let index = graph.add_node(VisualNode {
            entity_id: entity.id.clone(),
            label: entity.name.clone(),
            attributes: entity.attributes.clone(),
            position: entity.position,
        });
        index_by_id.insert(entity.id.as_str(), index);
    }

    for relationship in relationships {
        let source = index_by_id.get(relationship.source_entity_id.as_str());
        let target = index_by_id.get(relationship.target_entity_id.as_str());
        let (Some(&source), Some(&target)) = (source, target) else {
            warn!(relationship_id = %relationship.id, "skipping edge with missing endpoint");
            continue;
        };
        graph.add_edge(
            source,
            target,
            VisualEdge {
                relationship_id: relationship.id.clone(),
                relationship_type: relationship.relationship_type,
                source_cardinality: relationship.source_cardinality,
                target_cardinality: relationship.target_cardinality,
            },
        );
    }

    graph
}
