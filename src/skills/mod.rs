//! Skill progression: experience curves, level-up loop, requirement checks.
//!
//! Progression is through use:
//! - hitting ore feeds `mining`
//! - hitting trees with the axe feeds `woodcutting`
//! - punching feeds `fist`
//! - collected experience orbs feed the orb skill (`player` by default)
//!
//! Each skill owns an [`XpCurve`] giving the experience needed to leave a level.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::constants::{FIST_BASE_XP, MAX_SKILL_LEVEL, SKILL_BASE_XP, SKILL_GROWTH};

pub const MINING: &str = "mining";
pub const WOODCUTTING: &str = "woodcutting";
pub const FIST: &str = "fist";
pub const PLAYER: &str = "player";

/// Experience required to advance from `level` to `level + 1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum XpCurve {
    /// floor(base * growth^(level-1))
    Geometric { base: f64, growth: f64 },
    /// base_xp * (level+1) * level / 4
    Combinatorial { base_xp: f64 },
}

impl Default for XpCurve {
    fn default() -> Self {
        Self::Geometric {
            base: SKILL_BASE_XP,
            growth: SKILL_GROWTH,
        }
    }
}

impl XpCurve {
    pub fn fist() -> Self {
        Self::Combinatorial {
            base_xp: FIST_BASE_XP,
        }
    }

    /// Never below 1, so the level-up loop always terminates.
    pub fn required_for(&self, level: u32) -> f64 {
        let level = level.max(1);
        let raw = match *self {
            Self::Geometric { base, growth } => (base * growth.powi(level as i32 - 1)).floor(),
            Self::Combinatorial { base_xp } => {
                let l = level as f64;
                base_xp * (l + 1.0) * l * 0.25
            }
        };
        if raw.is_finite() {
            raw.max(1.0)
        } else {
            f64::MAX
        }
    }

    /// Level and leftover experience reached from level 1 with `total` experience.
    /// Stops at [`MAX_SKILL_LEVEL`] and returns whatever is left over.
    pub fn level_from_total_experience(&self, total: f64) -> (u32, f64) {
        let mut level = 1;
        let mut remaining = if total.is_finite() { total.max(0.0) } else { 0.0 };
        while level < MAX_SKILL_LEVEL {
            let need = self.required_for(level);
            if remaining < need {
                break;
            }
            remaining -= need;
            level += 1;
        }
        (level, remaining)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub level: u32,
    pub experience: f64,
    pub max_experience: f64,
    pub total_experience: f64,
}

impl SkillState {
    pub fn new(curve: &XpCurve) -> Self {
        Self {
            level: 1,
            experience: 0.0,
            max_experience: curve.required_for(1),
            total_experience: 0.0,
        }
    }

    /// Adds experience and runs the level-up loop. Returns levels gained.
    pub fn add_experience(&mut self, amount: f64, curve: &XpCurve) -> u32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        self.experience += amount;
        self.total_experience += amount;

        let mut gained = 0;
        while self.experience >= self.max_experience && self.level < MAX_SKILL_LEVEL {
            self.level += 1;
            self.experience -= self.max_experience;
            self.max_experience = curve.required_for(self.level);
            gained += 1;
        }
        gained
    }

    /// 0.0..1.0 progress through the current level
    pub fn progress(&self) -> f32 {
        (self.experience / self.max_experience).clamp(0.0, 1.0) as f32
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_SKILL_LEVEL
    }
}

/// Result of [`SkillBook::add_experience`], what a skill UI displays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub level: u32,
    pub current_xp: f64,
    pub required_xp: f64,
    pub levels_gained: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub curve: XpCurve,
}

impl SkillDef {
    pub fn new(name: &str, curve: XpCurve) -> Self {
        Self {
            name: name.to_string(),
            curve,
        }
    }

    pub fn defaults() -> Vec<SkillDef> {
        vec![
            Self::new(MINING, XpCurve::default()),
            Self::new(WOODCUTTING, XpCurve::default()),
            Self::new(FIST, XpCurve::fist()),
            Self::new(PLAYER, XpCurve::default()),
        ]
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    pub name: String,
    pub level: u32,
    pub total_experience: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub skill: String,
    pub level: u32,
}

#[derive(Debug, Clone)]
struct Skill {
    state: SkillState,
    curve: XpCurve,
}

/// All skills of one player
#[derive(Debug, Clone)]
pub struct SkillBook {
    skills: HashMap<String, Skill>,
    level_ups: Vec<LevelUp>,
}

impl Default for SkillBook {
    fn default() -> Self {
        Self::new(&SkillDef::defaults())
    }
}

impl SkillBook {
    pub fn new(defs: &[SkillDef]) -> Self {
        let skills = defs
            .iter()
            .map(|def| {
                (
                    def.name.clone(),
                    Skill {
                        state: SkillState::new(&def.curve),
                        curve: def.curve,
                    },
                )
            })
            .collect();
        Self {
            skills,
            level_ups: Vec::new(),
        }
    }

    pub fn add_experience(&mut self, name: &str, amount: f64) -> Option<SkillProgress> {
        let Some(skill) = self.skills.get_mut(name) else {
            warn!(skill = name, "experience granted to unknown skill");
            return None;
        };

        let levels_gained = skill.state.add_experience(amount, &skill.curve);
        if levels_gained > 0 {
            info!(skill = name, level = skill.state.level, "level up");
            self.level_ups.push(LevelUp {
                skill: name.to_string(),
                level: skill.state.level,
            });
        }

        Some(SkillProgress {
            level: skill.state.level,
            current_xp: skill.state.experience,
            required_xp: skill.state.max_experience,
            levels_gained,
        })
    }

    pub fn get(&self, name: &str) -> Option<&SkillState> {
        self.skills.get(name).map(|s| &s.state)
    }

    /// Level of a skill, 1 for unknown names
    pub fn level(&self, name: &str) -> u32 {
        self.get(name).map(|s| s.level).unwrap_or(1)
    }

    pub fn meets_requirement(&self, name: &str, required: u32) -> bool {
        self.get(name).is_some_and(|s| s.level >= required)
    }

    pub fn total_experience(&self) -> f64 {
        self.skills.values().map(|s| s.state.total_experience).sum()
    }

    /// Skills ordered by total experience, highest first
    pub fn snapshot(&self) -> Vec<SkillSnapshot> {
        let mut rows: Vec<SkillSnapshot> = self
            .skills
            .iter()
            .map(|(name, skill)| SkillSnapshot {
                name: name.clone(),
                level: skill
                    .curve
                    .level_from_total_experience(skill.state.total_experience)
                    .0,
                total_experience: skill.state.total_experience,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_experience
                .total_cmp(&a.total_experience)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }

    pub fn drain_level_ups(&mut self) -> Vec<LevelUp> {
        std::mem::take(&mut self.level_ups)
    }
}
