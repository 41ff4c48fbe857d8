//! Harvestable resource nodes (trees and ores).
//!
//! Life cycle: `Alive -> Broken -> RespawnPending -> Alive`, keeping the
//! same id and position across respawns. Consumed ores skip the pending
//! state and are pruned from the store.

pub mod kind;
pub mod manager;

pub use kind::{NodeCategory, NodeKind, OreType, TreeType};
pub use manager::{NodeManager, NodeSlot, NodeUpdate, PlacementRules, PopulationRule, RespawnPlaceholder};

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::SourceId;
use crate::constants::NODE_SHAKE_MS;
use crate::error::{Result, SimError};
use crate::geometry::{CircleTarget, SquareTarget};

pub type NodeId = u64;

/// What a single damage application did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    pub applied: f32,
    pub remaining: f32,
    pub destroyed: bool,
    /// Target was already broken; nothing changed
    pub ignored: bool,
}

pub trait Damageable {
    fn is_damageable(&self) -> bool;
    fn apply_damage(&mut self, amount: f32, source: SourceId) -> DamageOutcome;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: NodeId,
    pub position: Vec2,
    pub kind: NodeKind,
    pub health: f32,
    pub max_health: f32,
    pub broken: bool,
    /// Hardness for ores, size tier for trees
    pub level: u32,
    pub respawn_delay_ms: u64,
    pub radius: f32,
    pub shake_until: u64,
    pub last_hit_by: Option<SourceId>,
}

impl ResourceNode {
    pub fn new(id: NodeId, position: Vec2, kind: NodeKind, level: u32) -> Self {
        let level = level.max(1);
        let max_health = kind.max_health(level);
        Self {
            id,
            position,
            kind,
            health: max_health,
            max_health,
            broken: false,
            level,
            respawn_delay_ms: kind.respawn_delay_ms().unwrap_or(0),
            radius: kind.radius(level),
            shake_until: 0,
            last_hit_by: None,
        }
    }

    pub fn category(&self) -> NodeCategory {
        self.kind.category()
    }

    pub fn is_alive(&self) -> bool {
        !self.broken && self.health > 0.0
    }

    pub fn shake(&mut self, now: u64) {
        self.shake_until = now + NODE_SHAKE_MS;
    }

    pub fn is_shaking(&self, now: u64) -> bool {
        now < self.shake_until
    }

    pub fn as_circle(&self) -> CircleTarget {
        CircleTarget {
            position: self.position,
            radius: self.radius,
            health: self.health,
            broken: self.broken,
            visible: true,
        }
    }

    pub fn as_square(&self) -> SquareTarget {
        SquareTarget {
            position: self.position,
            half_size: self.radius,
            chopped: self.broken || self.health <= 0.0,
        }
    }

    /// Whether `point` lies inside the node's hitbox
    pub fn contains(&self, point: Vec2) -> bool {
        match self.kind.category() {
            NodeCategory::Tree => {
                crate::geometry::point_in_square(point, self.position, self.radius)
            }
            NodeCategory::Ore => point.distance(self.position) <= self.radius,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let corrupt = |reason: &str| SimError::CorruptNode {
            id: self.id,
            reason: reason.to_string(),
        };
        if !self.position.is_finite() {
            return Err(corrupt("non-finite position"));
        }
        if !self.max_health.is_finite() || self.max_health <= 0.0 {
            return Err(corrupt("max health not positive"));
        }
        if !self.health.is_finite() || self.health > self.max_health || self.health < 0.0 {
            return Err(corrupt("health out of range"));
        }
        if self.health <= 0.0 && !self.broken {
            return Err(corrupt("zero health but not broken"));
        }
        Ok(())
    }

    /// Brings a node that failed [`validate`](Self::validate) back into range.
    pub fn repair(&mut self) {
        let expected = self.kind.max_health(self.level);
        if !self.max_health.is_finite() || self.max_health <= 0.0 {
            self.max_health = expected;
        }
        if !self.health.is_finite() {
            self.health = 0.0;
        }
        self.health = self.health.clamp(0.0, self.max_health);
        if self.health <= 0.0 {
            self.broken = true;
        }
        if !self.position.is_finite() {
            self.position = Vec2::ZERO;
            self.broken = true;
        }
    }

    /// Per-tick housekeeping
    pub fn tick(&mut self, now: u64) -> Result<()> {
        if self.shake_until != 0 && now >= self.shake_until {
            self.shake_until = 0;
        }
        self.validate()
    }
}

impl Damageable for ResourceNode {
    fn is_damageable(&self) -> bool {
        self.is_alive()
    }

    fn apply_damage(&mut self, amount: f32, source: SourceId) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome {
                ignored: true,
                remaining: self.health,
                ..Default::default()
            };
        }

        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        self.last_hit_by = Some(source);
        if self.health <= 0.0 {
            self.broken = true;
        }

        DamageOutcome {
            applied: before - self.health,
            remaining: self.health,
            destroyed: self.broken,
            ignored: false,
        }
    }
}
