//! World state - entities, components, obstacles, and the event feed
//!
//! This is the narrow collaborator surface the reasoning core runs against:
//! an entity/component store, a spatial query, the obstacle predicate, and
//! the recent-event buffer that prompt building reads.

pub mod blocking;

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::core::types::{EntityId, GridPos, Tick};
use crate::reasoning::state::AiState;

pub use blocking::BlockedCells;

/// One entry in the recent-event feed
#[derive(Debug, Clone)]
pub struct WorldEvent {
    pub tick: Tick,
    pub text: String,
}

/// The simulation world containing all entities
pub struct World {
    pub current_tick: Tick,
    next_entity: u64,
    names: AHashMap<EntityId, String>,
    positions: AHashMap<EntityId, GridPos>,
    items: AHashSet<EntityId>,
    ai: AHashMap<EntityId, AiState>,
    /// Ability names each agent has learned, keyed by stable string id
    abilities: AHashMap<EntityId, Vec<String>>,
    pub blocked: BlockedCells,
    events: VecDeque<WorldEvent>,
    event_buffer: usize,
}

impl World {
    pub fn new() -> Self {
        Self::with_event_buffer(64)
    }

    pub fn with_event_buffer(event_buffer: usize) -> Self {
        Self {
            current_tick: 0,
            next_entity: 1,
            names: AHashMap::new(),
            positions: AHashMap::new(),
            items: AHashSet::new(),
            ai: AHashMap::new(),
            abilities: AHashMap::new(),
            blocked: BlockedCells::new(),
            events: VecDeque::new(),
            event_buffer,
        }
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    // === ENTITY STORE ===

    pub fn spawn(&mut self, name: impl Into<String>, pos: GridPos) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.names.insert(id, name.into());
        self.positions.insert(id, pos);
        id
    }

    /// Spawn an entity that can be the target of a `PICKUP` action
    pub fn spawn_item(&mut self, name: impl Into<String>, pos: GridPos) -> EntityId {
        let id = self.spawn(name, pos);
        self.items.insert(id);
        id
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.names.remove(&id);
        self.positions.remove(&id);
        self.items.remove(&id);
        self.ai.remove(&id);
        self.abilities.remove(&id);
    }

    pub fn has_entity(&self, id: EntityId) -> bool {
        self.names.contains_key(&id)
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn position(&self, id: EntityId) -> Option<GridPos> {
        self.positions.get(&id).copied()
    }

    pub fn set_position(&mut self, id: EntityId, pos: GridPos) {
        if let Some(slot) = self.positions.get_mut(&id) {
            *slot = pos;
        }
    }

    pub fn is_item(&self, id: EntityId) -> bool {
        self.items.contains(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.names.len()
    }

    // === AI COMPONENTS ===

    /// Attach AI control to an entity
    pub fn add_ai(&mut self, id: EntityId, state: AiState) {
        self.ai.insert(id, state);
    }

    pub fn ai(&self, id: EntityId) -> Option<&AiState> {
        self.ai.get(&id)
    }

    pub fn ai_mut(&mut self, id: EntityId) -> Option<&mut AiState> {
        self.ai.get_mut(&id)
    }

    /// Detach an agent's state for the duration of its reasoning pass.
    /// The caller reattaches with `add_ai`.
    pub fn take_ai(&mut self, id: EntityId) -> Option<AiState> {
        self.ai.remove(&id)
    }

    /// All AI-controlled entity ids, in stable order for deterministic ticks
    pub fn agent_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.ai.keys().copied().collect();
        ids.sort();
        ids
    }

    // === ABILITIES ===

    /// Register a learned ability under its stable identifier
    pub fn grant_ability(&mut self, id: EntityId, name: impl Into<String>) {
        self.abilities.entry(id).or_default().push(name.into());
    }

    pub fn known_abilities(&self, id: EntityId) -> &[String] {
        self.abilities.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    // === SPATIAL ===

    /// Entities within `radius` (Manhattan) of `center`, excluding `center`'s
    /// own occupant when `exclude` is given
    pub fn query_radius(
        &self,
        center: GridPos,
        radius: u32,
        exclude: Option<EntityId>,
    ) -> Vec<(EntityId, GridPos)> {
        let mut found: Vec<(EntityId, GridPos)> = self
            .positions
            .iter()
            .filter(|(id, pos)| Some(**id) != exclude && center.manhattan(pos) <= radius)
            .map(|(id, pos)| (*id, *pos))
            .collect();
        found.sort_by_key(|(id, _)| *id);
        found
    }

    pub fn is_blocked(&self, pos: GridPos) -> bool {
        self.blocked.is_blocked(pos)
    }

    // === EVENTS ===

    /// Append to the recent-event feed, evicting the oldest past the cap
    pub fn push_event(&mut self, text: impl Into<String>) {
        self.events.push_back(WorldEvent {
            tick: self.current_tick,
            text: text.into(),
        });
        while self.events.len() > self.event_buffer {
            self.events.pop_front();
        }
    }

    pub fn recent_events(&self) -> impl DoubleEndedIterator<Item = &WorldEvent> {
        self.events.iter()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
