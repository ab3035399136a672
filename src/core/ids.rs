//! Identifier allocation for entities and relationships
//!
//! Ids are stable for the lifetime of an editing session and are never
//! reused after a delete, so stale visual references can never collide
//! with a newly created entity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates session-unique ids with a type prefix (`entity-3`, `rel-0`).
///
/// Counters are post-incremented atomically; the returned id always embeds
/// the value the counter held *before* the increment was applied, and no two
/// calls can observe the same value.
#[derive(Debug, Default)]
pub struct IdAllocator {
    entity_counter: AtomicU64,
    relationship_counter: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_entity_id(&self) -> String {
        let n = self.entity_counter.fetch_add(1, Ordering::Relaxed);
        format!("entity-{}", n)
    }

    pub fn next_relationship_id(&self) -> String {
        let n = self.relationship_counter.fetch_add(1, Ordering::Relaxed);
        format!("rel-{}", n)
    }
}
