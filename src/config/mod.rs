//! Simulation tuning file.
//!
//! Every section defaults to the built-in tuning, so a config file only
//! needs the values it overrides. `.ron` and `.json` files are accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::combat::CombatConfig;
use crate::constants::{DEFAULT_WORLD_SEED, PLAYER_RADIUS};
use crate::error::{Result, SimError};
use crate::nodes::{PlacementRules, PopulationRule};
use crate::orbs::OrbConfig;
use crate::skills::{SkillDef, PLAYER};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u64,
    pub player_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_WORLD_SEED,
            player_radius: PLAYER_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    pub placement: PlacementRules,
    pub trees: PopulationRule,
    pub ores: PopulationRule,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            placement: PlacementRules::default(),
            trees: PopulationRule::trees(),
            ores: PopulationRule::ores(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub nodes: NodesConfig,
    pub orbs: OrbConfig,
    pub combat: CombatConfig,
    pub skills: Vec<SkillDef>,
    /// Skill that collected orb experience feeds
    pub orb_skill: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            nodes: NodesConfig::default(),
            orbs: OrbConfig::default(),
            combat: CombatConfig::default(),
            skills: SkillDef::defaults(),
            orb_skill: PLAYER.to_string(),
        }
    }
}

fn positive(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid_config(field, format!("must be positive, got {value}")))
    }
}

fn fraction(field: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid_config(field, format!("must be within 0..=1, got {value}")))
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Self::from_ron(&text)?,
            Some("json") => Self::from_json(&text)?,
            other => {
                return Err(SimError::invalid_config(
                    "path",
                    format!("unsupported config extension {other:?}"),
                ))
            }
        };
        config.validate()?;
        info!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| SimError::ConfigParse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SimError::ConfigParse(e.to_string()))
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SimError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        positive("world.player_radius", self.world.player_radius)?;

        let p = &self.nodes.placement;
        positive("nodes.placement.min_distance_between_nodes", p.min_distance_between_nodes)?;
        positive("nodes.placement.min_distance_to_other_objects", p.min_distance_to_other_objects)?;
        if !(p.reference_buffer.is_finite() && p.reference_buffer >= 0.0) {
            return Err(SimError::invalid_config("nodes.placement.reference_buffer", "must be >= 0"));
        }
        if p.spawn_attempts == 0 {
            return Err(SimError::invalid_config("nodes.placement.spawn_attempts", "must be at least 1"));
        }
        fraction("nodes.placement.ring_min", p.ring_min)?;
        fraction("nodes.placement.ring_max", p.ring_max)?;
        if p.ring_min > p.ring_max {
            return Err(SimError::invalid_config("nodes.placement.ring_min", "exceeds ring_max"));
        }
        for (name, rule) in [("nodes.trees", &self.nodes.trees), ("nodes.ores", &self.nodes.ores)] {
            positive(&format!("{name}.view_radius"), rule.view_radius)?;
            if rule.min_count > rule.max_total {
                return Err(SimError::invalid_config(name, "min_count exceeds max_total"));
            }
        }

        let o = &self.orbs;
        if o.max_value == 0 {
            return Err(SimError::invalid_config("orbs.max_value", "must be at least 1"));
        }
        positive("orbs.min_radius", o.min_radius)?;
        if o.min_radius > o.max_radius {
            return Err(SimError::invalid_config("orbs.min_radius", "exceeds max_radius"));
        }
        positive("orbs.magnet_distance", o.magnet_distance)?;
        positive("orbs.collection_distance", o.collection_distance)?;
        positive("orbs.merge_distance", o.merge_distance)?;
        positive("orbs.max_speed", o.max_speed)?;
        fraction("orbs.damping", o.damping)?;
        fraction("orbs.magnet_damping", o.magnet_damping)?;
        if o.lifetime_ms == 0 {
            return Err(SimError::invalid_config("orbs.lifetime_ms", "must be positive"));
        }
        if o.fade_out_ms > o.lifetime_ms {
            return Err(SimError::invalid_config("orbs.fade_out_ms", "exceeds lifetime_ms"));
        }
        if o.burst_ring_min > o.burst_ring_max {
            return Err(SimError::invalid_config("orbs.burst_ring_min", "exceeds burst_ring_max"));
        }

        for profile in self.combat.weapons.iter() {
            let field = |name: &str| format!("combat.weapons.{}.{name}", profile.kind);
            positive(&field("range"), profile.range)?;
            positive(&field("duration_ms"), profile.duration_ms)?;
            fraction(&field("hit_fraction"), profile.hit_fraction)?;
            if !(profile.cooldown_ms.is_finite() && profile.cooldown_ms >= 0.0) {
                return Err(SimError::invalid_config(&field("cooldown_ms"), "must be >= 0"));
            }
            if profile.skill.trim().is_empty() {
                return Err(SimError::invalid_config(&field("skill"), "must not be empty"));
            }
        }
        let fist = &self.combat.fist;
        if fist.min_cooldown_ms > self.combat.weapons.fist.cooldown_ms {
            return Err(SimError::invalid_config(
                "combat.fist.min_cooldown_ms",
                "exceeds the fist base cooldown",
            ));
        }
        if fist.click_window_ms == 0 {
            return Err(SimError::invalid_config("combat.fist.click_window_ms", "must be positive"));
        }
        fraction("combat.fist.max_crit_chance", fist.max_crit_chance)?;

        if self.skills.iter().any(|s| s.name.trim().is_empty()) {
            return Err(SimError::invalid_config("skills", "skill names must not be empty"));
        }
        for profile in self.combat.weapons.iter() {
            if !self.skills.iter().any(|s| s.name == profile.skill) {
                return Err(SimError::UnknownSkill(profile.skill.clone()));
            }
        }
        if !self.skills.iter().any(|s| s.name == self.orb_skill) {
            return Err(SimError::UnknownSkill(self.orb_skill.clone()));
        }

        Ok(())
    }
}
