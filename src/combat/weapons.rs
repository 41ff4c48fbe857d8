//! Weapon profiles: timing, reach, hit geometry and experience per weapon.
//!
//! Each archetype trades speed for reach:
//! - pickaxe: slow heavy swing, narrow cone, hit lands late in the swing
//! - axe: wide arc that can fell several trees at higher woodcutting levels
//! - fist: fast jab in a short box, cooldown adapts to click rate

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use super::{SkillLevels, TargetCategory, WeaponKind};
use crate::constants::AXE_LEVELS_PER_EXTRA_TARGET;
use crate::geometry::HitShape;
use crate::skills::{FIST, MINING, WOODCUTTING};

/// Full weapon definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub kind: WeaponKind,
    pub cooldown_ms: f32,
    pub duration_ms: f32,
    /// Fraction of the swing at which the scheduled hit check fires
    pub hit_fraction: f32,
    pub range: f32,
    pub angle_width: f32,
    pub shape: HitShape,
    pub base_damage: f32,
    /// Pickaxe: damage gained per point of strength
    pub strength_scale: f32,
    /// Axe: damage gained per woodcutting level
    pub level_bonus_per_level: f32,
    pub xp_per_hit: f64,
    pub destroy_bonus_xp: f64,
    pub skill: String,
    pub reach: Vec<TargetCategory>,
    pub required_level: u32,
    pub swing_sound: String,
}

impl WeaponProfile {
    pub fn hit_check_offset_ms(&self) -> u64 {
        (self.duration_ms * self.hit_fraction).round().max(0.0) as u64
    }

    pub fn reaches(&self, category: TargetCategory) -> bool {
        self.reach.contains(&category)
    }

    /// Targets one swing may damage
    pub fn max_targets(&self, levels: &SkillLevels) -> usize {
        match self.kind {
            WeaponKind::Pickaxe | WeaponKind::Fist => 1,
            WeaponKind::Axe => 1 + (levels.woodcutting / AXE_LEVELS_PER_EXTRA_TARGET) as usize,
        }
    }
}

/// Predefined weapon templates
pub fn pickaxe() -> WeaponProfile {
    WeaponProfile {
        kind: WeaponKind::Pickaxe,
        cooldown_ms: 600.0,
        duration_ms: 400.0,
        hit_fraction: 0.9,
        range: 60.0,
        angle_width: PI / 3.0,
        shape: HitShape::Cone,
        base_damage: 1.0,
        strength_scale: 0.1,
        level_bonus_per_level: 0.0,
        xp_per_hit: 2.0,
        destroy_bonus_xp: 10.0,
        skill: MINING.into(),
        reach: vec![TargetCategory::Ore, TargetCategory::Tree, TargetCategory::Enemy],
        required_level: 1,
        swing_sound: "pickaxe_swing".into(),
    }
}

pub fn axe() -> WeaponProfile {
    WeaponProfile {
        kind: WeaponKind::Axe,
        cooldown_ms: 700.0,
        duration_ms: 450.0,
        hit_fraction: 0.5,
        range: 70.0,
        angle_width: PI * 0.75,
        shape: HitShape::Cone,
        base_damage: 1.0,
        strength_scale: 0.0,
        level_bonus_per_level: 0.1,
        xp_per_hit: 2.0,
        destroy_bonus_xp: 10.0,
        skill: WOODCUTTING.into(),
        reach: vec![TargetCategory::Tree, TargetCategory::Ore, TargetCategory::Enemy],
        required_level: 1,
        swing_sound: "axe_swing".into(),
    }
}

pub fn fist() -> WeaponProfile {
    WeaponProfile {
        kind: WeaponKind::Fist,
        cooldown_ms: 250.0,
        duration_ms: 200.0,
        hit_fraction: 0.5,
        range: 35.0,
        angle_width: PI / 4.0,
        shape: HitShape::Rect { width: 30.0 },
        base_damage: 1.0,
        strength_scale: 0.0,
        level_bonus_per_level: 0.0,
        xp_per_hit: 1.0,
        destroy_bonus_xp: 5.0,
        skill: FIST.into(),
        reach: vec![TargetCategory::Ore, TargetCategory::Tree, TargetCategory::Enemy],
        required_level: 1,
        swing_sound: "punch".into(),
    }
}

/// Profiles for every weapon archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponSet {
    pub pickaxe: WeaponProfile,
    pub axe: WeaponProfile,
    pub fist: WeaponProfile,
}

impl Default for WeaponSet {
    fn default() -> Self {
        Self {
            pickaxe: pickaxe(),
            axe: axe(),
            fist: fist(),
        }
    }
}

impl WeaponSet {
    pub fn get(&self, kind: WeaponKind) -> &WeaponProfile {
        match kind {
            WeaponKind::Pickaxe => &self.pickaxe,
            WeaponKind::Axe => &self.axe,
            WeaponKind::Fist => &self.fist,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponProfile> {
        [&self.pickaxe, &self.axe, &self.fist].into_iter()
    }
}
