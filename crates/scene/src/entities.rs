use std::collections::BTreeMap;

use glam::Vec3;
use pinpoint_common::{EntityId, Transform};

/// Per-entity data stored in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityData {
    pub transform: Transform,
}

/// Scene-owned table of movable entities.
///
/// Consumers hold [`EntityId`] handles and re-resolve them on every read, so
/// a despawned entity shows up as `None` instead of a dangling reference.
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: BTreeMap<EntityId, EntityData>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Spawn a new entity with the given transform. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, transform);
        id
    }

    pub fn spawn_with_id(&mut self, id: EntityId, transform: Transform) {
        self.entities.insert(id, EntityData { transform });
    }

    /// Remove an entity. Returns the data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Absolute position of an entity, if it still exists.
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|d| d.transform.position)
    }

    /// Move an entity. Returns false if it no longer exists.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => {
                data.transform.position = position;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityData)> {
        self.entities.iter()
    }
}
