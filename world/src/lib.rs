#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Space Invaders server.
//!
//! The world maps every [`EntityKind`] to the ordered collection of entities
//! of that kind. A kind that was never set is distinct from a kind that was
//! set to an empty collection: the former is a missing precondition, the
//! latter a legitimately empty pool.

use std::collections::BTreeMap;

use space_invaders_core::{EntityId, EntityKind, Position};

/// Entity placed in the world by the layout system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogicEntity {
    id: EntityId,
    kind: EntityKind,
    position: Position,
}

impl LogicEntity {
    /// Creates a new entity at the provided position.
    #[must_use]
    pub const fn new(id: EntityId, kind: EntityKind, position: Position) -> Self {
        Self { id, kind, position }
    }

    /// Identifier assigned at placement.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Category of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Current top-left position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Horizontal coordinate of the top-left corner.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.position.x()
    }

    /// Vertical coordinate of the top-left corner.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.position.y()
    }

    /// Moves the entity to a new position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }
}

/// Container mapping each entity kind to its placed entities.
#[derive(Clone, Debug, Default)]
pub struct World {
    entities: BTreeMap<EntityKind, Vec<LogicEntity>>,
}

impl World {
    /// Creates a world with no populated kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full collection of entities for a kind.
    pub fn set_entities(&mut self, kind: EntityKind, entities: Vec<LogicEntity>) {
        debug_assert!(
            entities.iter().all(|entity| entity.kind() == kind),
            "collection for {kind} contains entities of another kind"
        );
        let _ = self.entities.insert(kind, entities);
    }

    /// Iterates the entities of a kind in placement order.
    ///
    /// Returns `None` when the kind was never populated.
    pub fn entities(&self, kind: EntityKind) -> Option<impl Iterator<Item = &LogicEntity> + '_> {
        self.entities.get(&kind).map(|entities| entities.iter())
    }

    /// Looks up an entity of the given kind for mutation.
    pub fn entity_mut(&mut self, kind: EntityKind, id: EntityId) -> Option<&mut LogicEntity> {
        self.entities
            .get_mut(&kind)?
            .iter_mut()
            .find(|entity| entity.id() == id)
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use serde::Serialize;
    use space_invaders_core::{EntityId, EntityKind};

    use super::{LogicEntity, World};

    /// Number of entities of a kind, or `None` when the kind was never populated.
    #[must_use]
    pub fn count(world: &World, kind: EntityKind) -> Option<usize> {
        world.entities.get(&kind).map(Vec::len)
    }

    /// Finds an entity of the given kind by identifier.
    #[must_use]
    pub fn entity(world: &World, kind: EntityKind, id: EntityId) -> Option<&LogicEntity> {
        world.entities(kind)?.find(|entity| entity.id() == id)
    }

    /// Captures a serializable snapshot of every populated kind.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let kinds = world
            .entities
            .iter()
            .map(|(kind, entities)| KindSnapshot {
                kind: *kind,
                entities: entities.iter().map(EntitySnapshot::from).collect(),
            })
            .collect();
        WorldSnapshot { kinds }
    }

    /// Read-only snapshot of the world handed to broadcast adapters.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct WorldSnapshot {
        /// Populated kinds in declaration order.
        pub kinds: Vec<KindSnapshot>,
    }

    impl WorldSnapshot {
        /// Entities captured for a kind, if it was populated.
        #[must_use]
        pub fn entities(&self, kind: EntityKind) -> Option<&[EntitySnapshot]> {
            self.kinds
                .iter()
                .find(|snapshot| snapshot.kind == kind)
                .map(|snapshot| snapshot.entities.as_slice())
        }
    }

    /// Entities of a single kind in placement order.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct KindSnapshot {
        /// Category of the captured entities.
        pub kind: EntityKind,
        /// Captured entities.
        pub entities: Vec<EntitySnapshot>,
    }

    /// Immutable representation of a single entity.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub struct EntitySnapshot {
        /// Identifier assigned at placement.
        pub id: EntityId,
        /// Horizontal coordinate of the top-left corner.
        pub x: i32,
        /// Vertical coordinate of the top-left corner.
        pub y: i32,
    }

    impl From<&LogicEntity> for EntitySnapshot {
        fn from(entity: &LogicEntity) -> Self {
            Self {
                id: entity.id(),
                x: entity.x(),
                y: entity.y(),
            }
        }
    }
}
