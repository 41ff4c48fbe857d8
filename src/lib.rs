//! Harvest - simulation core for a 2D mining/woodcutting game
//!
//! This crate holds the deterministic game logic behind the client:
//! - Hit-test geometry (cones, rectangles, proximity override)
//! - Skill progression (geometric and combinatorial curves)
//! - Experience orbs (magnetism, collection, merging, bursts)
//! - Resource nodes (trees and ores, respawn, population top-up)
//! - Melee attacks (pickaxe, axe, adaptive fist) and their orchestration
//! - Config loading with hot-reload, tracing setup and a Bevy plugin
//!
//! Rendering, audio, tool selection and UI are consumed through the traits
//! in [`hooks`] and [`render`].

pub mod combat;
pub mod config;
pub mod constants;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod hooks;
pub mod hotreload;
pub mod logging;
pub mod nodes;
pub mod orbs;
pub mod plugin;
pub mod render;
pub mod scheduler;
pub mod skills;
pub mod world;

/// Seeded generator lent to placement, orb scatter and crit rolls
pub type SimRng = rand_xoshiro::Xoshiro256PlusPlus;

pub use combat::{AttackSource, CombatOrchestrator, SourceId, WeaponKind};
pub use config::SimConfig;
pub use error::{Result, SimError};
pub use plugin::{HarvestPlugin, HarvestWorldResource};
pub use world::{HarvestWorld, WorldOutcome};
