//! Node store: spawning, population top-up, respawn placeholders, queries.

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;
use tracing::{debug, info, warn};

use super::{NodeCategory, NodeId, NodeKind, ResourceNode};
use crate::constants::*;

/// Stand-in for a destroyed node until its respawn time
#[derive(Debug, Clone, PartialEq)]
pub struct RespawnPlaceholder {
    pub id: NodeId,
    pub position: Vec2,
    pub kind: NodeKind,
    pub level: u32,
    pub respawn_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeSlot {
    Alive(ResourceNode),
    Pending(RespawnPlaceholder),
    /// Consumed for good; dropped by the next prune pass
    Depleted(NodeId),
}

impl NodeSlot {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Alive(node) => node.id,
            Self::Pending(p) => p.id,
            Self::Depleted(id) => *id,
        }
    }

    fn position(&self) -> Option<Vec2> {
        match self {
            Self::Alive(node) => Some(node.position),
            Self::Pending(p) => Some(p.position),
            Self::Depleted(_) => None,
        }
    }

    fn category(&self) -> Option<NodeCategory> {
        match self {
            Self::Alive(node) => Some(node.category()),
            Self::Pending(p) => Some(p.kind.category()),
            Self::Depleted(_) => None,
        }
    }

    fn live(&self) -> Option<&ResourceNode> {
        match self {
            Self::Alive(node) if node.is_alive() => Some(node),
            _ => None,
        }
    }
}

/// How many nodes of a category should surround the reference point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationRule {
    pub view_radius: f32,
    pub min_count: usize,
    pub max_total: usize,
}

impl PopulationRule {
    pub fn trees() -> Self {
        Self {
            view_radius: TREE_VIEW_RADIUS,
            min_count: TREE_MIN_COUNT,
            max_total: TREE_MAX_TOTAL,
        }
    }

    pub fn ores() -> Self {
        Self {
            view_radius: ORE_VIEW_RADIUS,
            min_count: ORE_MIN_COUNT,
            max_total: ORE_MAX_TOTAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRules {
    pub min_distance_between_nodes: f32,
    pub min_distance_to_other_objects: f32,
    pub reference_buffer: f32,
    pub spawn_attempts: u32,
    pub ring_min: f32,
    pub ring_max: f32,
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            min_distance_between_nodes: MIN_DISTANCE_BETWEEN_NODES,
            min_distance_to_other_objects: MIN_DISTANCE_TO_OTHER_OBJECTS,
            reference_buffer: REFERENCE_BUFFER,
            spawn_attempts: SPAWN_ATTEMPTS,
            ring_min: SPAWN_RING_MIN,
            ring_max: SPAWN_RING_MAX,
        }
    }
}

/// What one [`NodeManager::update`] pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub respawned: Vec<NodeId>,
    pub repaired: usize,
    pub pruned: usize,
}

#[derive(Debug, Clone)]
pub struct NodeManager {
    pub placement: PlacementRules,
    slots: Vec<NodeSlot>,
    index: HashMap<NodeId, usize>,
    next_id: NodeId,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new(PlacementRules::default())
    }
}

impl NodeManager {
    pub fn new(placement: PlacementRules) -> Self {
        Self {
            placement,
            slots: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn spawn_node(&mut self, kind: NodeKind, position: Vec2) -> NodeId {
        self.spawn_node_at_level(kind, position, kind.default_level())
    }

    pub fn spawn_node_at_level(&mut self, kind: NodeKind, position: Vec2, level: u32) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.index.insert(id, self.slots.len());
        self.slots
            .push(NodeSlot::Alive(ResourceNode::new(id, position, kind, level)));
        debug!(id, kind = kind.display_name(), x = position.x, y = position.y, "spawned node");
        id
    }

    pub fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.index.get(&id).and_then(|&i| self.slots.get(i))
    }

    pub fn slots(&self) -> &[NodeSlot] {
        &self.slots
    }

    /// Live node by id; placeholders and broken nodes are invisible here.
    pub fn get(&self, id: NodeId) -> Option<&ResourceNode> {
        self.slot(id).and_then(NodeSlot::live)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ResourceNode> {
        let i = *self.index.get(&id)?;
        match self.slots.get_mut(i)? {
            NodeSlot::Alive(node) if node.is_alive() => Some(node),
            _ => None,
        }
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &ResourceNode> {
        self.slots.iter().filter_map(NodeSlot::live)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &RespawnPlaceholder> {
        self.slots.iter().filter_map(|slot| match slot {
            NodeSlot::Pending(p) => Some(p),
            _ => None,
        })
    }

    /// First live node whose hitbox contains `pos`
    pub fn node_at(&self, pos: Vec2) -> Option<&ResourceNode> {
        self.iter_live().find(|node| node.contains(pos))
    }

    /// Live nodes whose hitbox reaches within `radius` of `pos`, nearest first
    pub fn nodes_in_radius(&self, pos: Vec2, radius: f32) -> Vec<&ResourceNode> {
        let mut found: Vec<&ResourceNode> = self
            .iter_live()
            .filter(|node| node.position.distance(pos) <= radius + node.radius)
            .collect();
        found.sort_by(|a, b| {
            a.position
                .distance_squared(pos)
                .total_cmp(&b.position.distance_squared(pos))
                .then(a.id.cmp(&b.id))
        });
        found
    }

    pub fn live_count(&self, category: NodeCategory) -> usize {
        self.iter_live().filter(|n| n.category() == category).count()
    }

    /// Alive plus pending respawns
    pub fn total_count(&self, category: NodeCategory) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.category() == Some(category))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Turns a destroyed node into a respawn placeholder, or a tombstone
    /// for kinds that never come back. Returns false for unknown ids and
    /// slots that are already pending.
    pub fn on_destroyed(&mut self, id: NodeId, now: u64) -> bool {
        let Some(&i) = self.index.get(&id) else {
            debug!(id, "destroy for unknown node");
            return false;
        };
        let NodeSlot::Alive(node) = &self.slots[i] else {
            debug!(id, "destroy for node that is not alive");
            return false;
        };

        let replacement = match node.kind.respawn_delay_ms() {
            Some(delay) => NodeSlot::Pending(RespawnPlaceholder {
                id,
                position: node.position,
                kind: node.kind,
                level: node.level,
                respawn_at: now + delay,
            }),
            None => NodeSlot::Depleted(id),
        };
        info!(id, kind = node.kind.display_name(), "node destroyed");
        self.slots[i] = replacement;
        true
    }

    /// Respawns due placeholders, runs per-node housekeeping and prunes
    /// consumed nodes. A corrupt node is logged and repaired; the pass
    /// continues with the next one.
    pub fn update(&mut self, now: u64) -> NodeUpdate {
        let mut report = NodeUpdate::default();
        let mut newly_broken = Vec::new();

        for slot in self.slots.iter_mut() {
            match slot {
                NodeSlot::Pending(p) if p.respawn_at <= now => {
                    let node = ResourceNode::new(p.id, p.position, p.kind, p.level);
                    debug!(id = p.id, "node respawned");
                    report.respawned.push(p.id);
                    *slot = NodeSlot::Alive(node);
                }
                NodeSlot::Alive(node) => {
                    if let Err(err) = node.tick(now) {
                        warn!(%err, "repairing node");
                        node.repair();
                        report.repaired += 1;
                    }
                    if node.broken {
                        newly_broken.push(node.id);
                    }
                }
                _ => {}
            }
        }

        // Nodes broken outside hit resolution still go through the life cycle
        for id in newly_broken {
            self.on_destroyed(id, now);
        }

        report.pruned = self.prune();
        report
    }

    fn prune(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| !matches!(slot, NodeSlot::Depleted(_)));
        let pruned = before - self.slots.len();
        if pruned > 0 {
            self.index = self
                .slots
                .iter()
                .enumerate()
                .map(|(i, slot)| (slot.id(), i))
                .collect();
        }
        pruned
    }

    pub fn is_valid_spawn_position(
        &self,
        pos: Vec2,
        category: NodeCategory,
        reference: Vec2,
    ) -> bool {
        if pos.distance(reference) < self.placement.reference_buffer {
            return false;
        }
        self.slots.iter().all(|slot| {
            let (Some(other), Some(other_cat)) = (slot.position(), slot.category()) else {
                return true;
            };
            let min = if other_cat == category {
                self.placement.min_distance_between_nodes
            } else {
                self.placement.min_distance_to_other_objects
            };
            pos.distance(other) >= min
        })
    }

    /// Tops the category up to `rule.min_count` live nodes in view, never
    /// exceeding `rule.max_total`. Returns the ids spawned.
    pub fn ensure_population_around(
        &mut self,
        reference: Vec2,
        category: NodeCategory,
        rule: &PopulationRule,
        rng: &mut impl Rng,
    ) -> Vec<NodeId> {
        let in_view = self
            .iter_live()
            .filter(|n| n.category() == category && n.position.distance(reference) <= rule.view_radius)
            .count();
        let total = self.total_count(category);
        if in_view >= rule.min_count || total >= rule.max_total {
            return Vec::new();
        }

        let wanted = (rule.min_count - in_view).min(rule.max_total - total);
        let mut spawned = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            match self.find_spawn_position(reference, category, rule.view_radius, rng) {
                Some(pos) => {
                    let kind = NodeKind::random(category, rng);
                    let level = kind.random_level(rng);
                    spawned.push(self.spawn_node_at_level(kind, pos, level));
                }
                None => debug!(?category, "no valid spawn position, skipping"),
            }
        }
        spawned
    }

    fn find_spawn_position(
        &self,
        reference: Vec2,
        category: NodeCategory,
        view_radius: f32,
        rng: &mut impl Rng,
    ) -> Option<Vec2> {
        let (ring_min, ring_max) = (self.placement.ring_min, self.placement.ring_max);
        for _ in 0..self.placement.spawn_attempts {
            let angle = rng.gen_range(0.0..TAU);
            let frac = if ring_max > ring_min {
                rng.gen_range(ring_min..=ring_max)
            } else {
                ring_min
            };
            let pos = reference + Vec2::new(angle.cos(), angle.sin()) * view_radius * frac;
            if self.is_valid_spawn_position(pos, category, reference) {
                return Some(pos);
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}
