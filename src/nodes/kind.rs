//! Kind-specific node stats.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    Tree,
    Ore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeType {
    Oak,
    Pine,
    Birch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OreType {
    Stone,
    Copper,
    Iron,
    Gold,
}

impl TreeType {
    pub const ALL: [TreeType; 3] = [Self::Oak, Self::Pine, Self::Birch];

    /// Largest size tier a tree grows to
    pub const MAX_SIZE: u32 = 3;
}

impl OreType {
    pub const ALL: [OreType; 4] = [Self::Stone, Self::Copper, Self::Iron, Self::Gold];

    pub fn hardness(&self) -> u32 {
        match self {
            Self::Stone => 1,
            Self::Copper => 2,
            Self::Iron => 3,
            Self::Gold => 4,
        }
    }

    /// Spawn weight out of 100
    fn weight(&self) -> u32 {
        match self {
            Self::Stone => 50,
            Self::Copper => 25,
            Self::Iron => 15,
            Self::Gold => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Tree(TreeType),
    Ore(OreType),
}

impl NodeKind {
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Tree(_) => NodeCategory::Tree,
            Self::Ore(_) => NodeCategory::Ore,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree(_))
    }

    pub fn is_ore(&self) -> bool {
        matches!(self, Self::Ore(_))
    }

    /// Trees pick a random size tier; ores are fixed at their hardness.
    pub fn default_level(&self) -> u32 {
        match self {
            Self::Tree(_) => 1,
            Self::Ore(ore) => ore.hardness(),
        }
    }

    pub fn random_level(&self, rng: &mut impl Rng) -> u32 {
        match self {
            Self::Tree(_) => rng.gen_range(1..=TreeType::MAX_SIZE),
            Self::Ore(ore) => ore.hardness(),
        }
    }

    pub fn random(category: NodeCategory, rng: &mut impl Rng) -> Self {
        match category {
            NodeCategory::Tree => {
                Self::Tree(TreeType::ALL[rng.gen_range(0..TreeType::ALL.len())])
            }
            NodeCategory::Ore => {
                let mut roll = rng.gen_range(0..100);
                for ore in OreType::ALL {
                    if roll < ore.weight() {
                        return Self::Ore(ore);
                    }
                    roll -= ore.weight();
                }
                Self::Ore(OreType::Stone)
            }
        }
    }

    fn health_per_level(&self) -> f32 {
        match self {
            Self::Tree(TreeType::Oak) => 8.0,
            Self::Tree(TreeType::Pine) => 10.0,
            Self::Tree(TreeType::Birch) => 6.0,
            Self::Ore(OreType::Stone) => 6.0,
            Self::Ore(OreType::Copper) => 5.0,
            Self::Ore(OreType::Iron) => 5.5,
            Self::Ore(OreType::Gold) => 6.0,
        }
    }

    pub fn max_health(&self, level: u32) -> f32 {
        self.health_per_level() * level.max(1) as f32
    }

    /// Circle radius for ores, square half-size for trees
    pub fn radius(&self, level: u32) -> f32 {
        match self {
            Self::Tree(_) => 18.0 + 4.0 * level.max(1) as f32,
            Self::Ore(OreType::Stone) | Self::Ore(OreType::Copper) => 18.0,
            Self::Ore(OreType::Iron) | Self::Ore(OreType::Gold) => 20.0,
        }
    }

    /// Experience dropped as an orb burst when destroyed
    pub fn orb_reward(&self, level: u32) -> u32 {
        let per_level = match self {
            Self::Tree(TreeType::Oak) => 6,
            Self::Tree(TreeType::Pine) => 8,
            Self::Tree(TreeType::Birch) => 5,
            Self::Ore(OreType::Stone) => 4,
            Self::Ore(OreType::Copper) => 4,
            Self::Ore(OreType::Iron) => 5,
            Self::Ore(OreType::Gold) => 8,
        };
        per_level * level.max(1)
    }

    /// `None` means the node is consumed for good
    pub fn respawn_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Tree(TreeType::Oak) => Some(30_000),
            Self::Tree(TreeType::Pine) => Some(45_000),
            Self::Tree(TreeType::Birch) => Some(20_000),
            Self::Ore(OreType::Stone) => Some(15_000),
            Self::Ore(OreType::Copper) => Some(25_000),
            Self::Ore(OreType::Iron) => Some(40_000),
            Self::Ore(OreType::Gold) => None,
        }
    }

    pub fn respawns(&self) -> bool {
        self.respawn_delay_ms().is_some()
    }

    pub fn hit_sound(&self) -> &'static str {
        match self {
            Self::Tree(_) => "chop",
            Self::Ore(_) => "pick",
        }
    }

    pub fn break_sound(&self) -> &'static str {
        match self {
            Self::Tree(_) => "tree_fall",
            Self::Ore(_) => "rock_break",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tree(TreeType::Oak) => "Oak Tree",
            Self::Tree(TreeType::Pine) => "Pine Tree",
            Self::Tree(TreeType::Birch) => "Birch Tree",
            Self::Ore(OreType::Stone) => "Stone",
            Self::Ore(OreType::Copper) => "Copper Ore",
            Self::Ore(OreType::Iron) => "Iron Ore",
            Self::Ore(OreType::Gold) => "Gold Ore",
        }
    }
}
