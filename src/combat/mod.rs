//! Melee combat against resource nodes.
//!
//! One [`attack::AttackStateMachine`] per (source, weapon) pair runs the
//! `Idle -> Swinging -> Idle` cycle behind an independent cooldown. The
//! [`orchestrator::CombatOrchestrator`] owns the machines, resolves hits
//! immediately on start and again at the weapon's mid-swing checkpoint.

pub mod attack;
pub mod damage;
pub mod fist;
pub mod orchestrator;
pub mod weapons;

pub use attack::AttackStateMachine;
pub use fist::{ClickRateTracker, FistTechnique, FistTuning};
pub use orchestrator::CombatOrchestrator;
pub use weapons::{WeaponProfile, WeaponSet};

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::effects::EffectQueue;
use crate::error::SimError;
use crate::geometry::{HitShape, Swing};
use crate::hooks::{Hooks, Tool};
use crate::nodes::{NodeCategory, NodeId, NodeManager};
use crate::orbs::OrbEconomy;
use crate::skills::{SkillBook, FIST, MINING, WOODCUTTING};
use crate::SimRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Pickaxe,
    Axe,
    Fist,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [Self::Pickaxe, Self::Axe, Self::Fist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickaxe => "pickaxe",
            Self::Axe => "axe",
            Self::Fist => "fist",
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeaponKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickaxe" => Ok(Self::Pickaxe),
            "axe" => Ok(Self::Axe),
            "fist" => Ok(Self::Fist),
            _ => Err(SimError::UnknownWeapon(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetCategory {
    Ore,
    Tree,
    Enemy,
}

impl From<NodeCategory> for TargetCategory {
    fn from(category: NodeCategory) -> Self {
        match category {
            NodeCategory::Ore => Self::Ore,
            NodeCategory::Tree => Self::Tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src{}", self.0)
    }
}

/// Skill levels that feed damage formulas and target caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevels {
    pub mining: u32,
    pub woodcutting: u32,
    pub fist: u32,
}

impl Default for SkillLevels {
    fn default() -> Self {
        Self {
            mining: 1,
            woodcutting: 1,
            fist: 1,
        }
    }
}

impl SkillLevels {
    pub fn from_book(book: &SkillBook) -> Self {
        Self {
            mining: book.level(MINING),
            woodcutting: book.level(WOODCUTTING),
            fist: book.level(FIST),
        }
    }

    pub fn get(&self, skill: &str) -> u32 {
        match skill {
            MINING => self.mining,
            WOODCUTTING => self.woodcutting,
            FIST => self.fist,
            _ => 1,
        }
    }
}

/// Whoever swings: position, stats and equipped tool at swing time
#[derive(Debug, Clone, PartialEq)]
pub struct AttackSource {
    pub id: SourceId,
    pub position: Vec2,
    pub strength: f32,
    pub levels: SkillLevels,
    pub tool: Option<Tool>,
    /// Hits grant skill experience to the local skill book
    pub grants_experience: bool,
}

impl AttackSource {
    pub fn new(id: SourceId, position: Vec2) -> Self {
        Self {
            id,
            position,
            strength: 0.0,
            levels: SkillLevels::default(),
            tool: None,
            grants_experience: true,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_levels(mut self, levels: SkillLevels) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Remote players damage nodes but never feed the local skill book
    pub fn remote(mut self) -> Self {
        self.grants_experience = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingPhase {
    Idle,
    Swinging,
}

/// One swing in flight
#[derive(Debug, Clone, PartialEq)]
pub struct AttackInstance {
    pub id: String,
    pub weapon: WeaponKind,
    pub direction: f32,
    pub source: SourceId,
    pub start_ms: u64,
    pub end_ms: u64,
    pub hit_check_ms: u64,
    pub hit_set: HashSet<NodeId>,
    pub range: f32,
    pub angle_width: f32,
    pub shape: HitShape,
    pub crit_chance: f32,
}

impl AttackInstance {
    pub fn swing(&self, origin: Vec2, player_radius: f32) -> Swing {
        Swing {
            range: self.range,
            angle_width: self.angle_width,
            direction: self.direction,
            shape: self.shape,
            source: Some(origin),
            player_radius,
        }
    }

    pub fn progress(&self, now: u64) -> f32 {
        let span = self.end_ms.saturating_sub(self.start_ms).max(1) as f32;
        (now.saturating_sub(self.start_ms) as f32 / span).clamp(0.0, 1.0)
    }
}

/// A landed hit, kept for the host and for tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub attack_id: String,
    pub source: SourceId,
    pub weapon: WeaponKind,
    pub target: NodeId,
    pub category: TargetCategory,
    pub damage: f32,
    pub crit: bool,
    pub destroyed: bool,
    pub at_ms: u64,
}

/// Active swing as the render layer sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingView {
    pub origin: Vec2,
    pub range: f32,
    pub direction: f32,
    pub angle_width: f32,
    pub shape: HitShape,
    pub progress: f32,
}

/// Everything hit resolution mutates, lent by the world for one call
pub struct CombatDeps<'a> {
    pub nodes: &'a mut NodeManager,
    pub orbs: &'a mut OrbEconomy,
    pub skills: &'a mut SkillBook,
    pub effects: &'a mut EffectQueue,
    pub hooks: &'a Hooks,
    pub rng: &'a mut SimRng,
    pub player_radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub weapons: WeaponSet,
    pub fist: FistTuning,
}
