//! Centralized tuning constants for the harvest simulation core.
//!
//! These are the defaults behind [`crate::config::SimConfig`]. Per-kind node
//! stats (health, orb rewards, respawn delays) stay in `nodes::kind` and
//! per-weapon numbers stay in `combat::weapons`, next to the types they describe.

// =====================================================
// World
// =====================================================

/// Default world seed (placement, orb scatter, crit rolls)
pub const DEFAULT_WORLD_SEED: u64 = 42;

/// Collision radius of a player avatar in world pixels
pub const PLAYER_RADIUS: f32 = 20.0;

/// Strength of a fresh player before any tool is equipped
pub const PLAYER_BASE_STRENGTH: f32 = 1.0;

/// Entities further than this outside the viewport are not drawn
pub const CULL_MARGIN: f32 = 100.0;

// =====================================================
// Resource nodes
// =====================================================

/// Placement retries per spawn request before the spawn is skipped
pub const SPAWN_ATTEMPTS: u32 = 10;

/// New nodes appear on a ring between these fractions of the view radius
pub const SPAWN_RING_MIN: f32 = 0.7;
pub const SPAWN_RING_MAX: f32 = 1.0;

/// Minimum spacing between two live nodes of the same category
pub const MIN_DISTANCE_BETWEEN_NODES: f32 = 120.0;

/// Minimum spacing between a tree and an ore (and vice versa)
pub const MIN_DISTANCE_TO_OTHER_OBJECTS: f32 = 80.0;

/// Nodes never spawn this close to the reference point (the player)
pub const REFERENCE_BUFFER: f32 = 150.0;

pub const TREE_VIEW_RADIUS: f32 = 1000.0;
pub const TREE_MIN_COUNT: usize = 15;
pub const TREE_MAX_TOTAL: usize = 50;

pub const ORE_VIEW_RADIUS: f32 = 1000.0;
pub const ORE_MIN_COUNT: usize = 8;
pub const ORE_MAX_TOTAL: usize = 30;

/// Extra reach added to a weapon's range when asking the node manager for candidates
pub const NODE_QUERY_MARGIN: f32 = 64.0;

/// How long a node shakes after being hit
pub const NODE_SHAKE_MS: u64 = 150;

// =====================================================
// Experience orbs
// =====================================================

pub const ORB_MAX_VALUE: u32 = 500;
pub const ORB_MIN_RADIUS: f32 = 3.0;
pub const ORB_MAX_RADIUS: f32 = 12.0;

/// Orbs start accelerating toward the collector inside this distance
pub const ORB_MAGNET_DISTANCE: f32 = 150.0;

/// Magnet acceleration at zero distance (px/s^2)
pub const ORB_MAGNET_STRENGTH: f32 = 1400.0;

pub const ORB_MAX_SPEED: f32 = 600.0;

/// Per-frame (60 Hz) velocity retention outside the magnet radius
pub const ORB_DAMPING: f32 = 0.90;

/// Per-frame (60 Hz) velocity retention inside the magnet radius
pub const ORB_MAGNET_DAMPING: f32 = 0.97;

pub const ORB_COLLECTION_DISTANCE: f32 = 24.0;
pub const ORB_MERGE_DISTANCE: f32 = 10.0;
pub const ORB_LIFETIME_MS: u64 = 60_000;
pub const ORB_FADE_OUT_MS: u64 = 3_000;
pub const ORB_COLLECT_ANIM_MS: u64 = 250;

/// Burst scatter ring (px) and initial outward speed (px/s)
pub const ORB_BURST_RING_MIN: f32 = 8.0;
pub const ORB_BURST_RING_MAX: f32 = 32.0;
pub const ORB_BURST_SPEED: f32 = 120.0;

// =====================================================
// Combat
// =====================================================

/// Critical hits double damage
pub const CRIT_DAMAGE_MULT: f32 = 2.0;

/// Pickaxe against trees (off-type)
pub const PICKAXE_TREE_MULT: f32 = 0.25;

/// Axe against ore (off-type)
pub const AXE_ORE_MULT: f32 = 0.5;

/// Axe gains one extra tree per this many woodcutting levels
pub const AXE_LEVELS_PER_EXTRA_TARGET: u32 = 5;

/// Playback volume of the swing sound
pub const SWING_VOLUME: f32 = 0.5;

pub const DAMAGE_NUMBER_LIFETIME_MS: u64 = 800;

/// Damage numbers drift upward at this speed (px/s)
pub const DAMAGE_NUMBER_RISE: f32 = 40.0;

// =====================================================
// Skills
// =====================================================

/// Geometric curve: floor(SKILL_BASE_XP * SKILL_GROWTH^(level-1))
pub const SKILL_BASE_XP: f64 = 100.0;
pub const SKILL_GROWTH: f64 = 1.1;

/// Level ceiling; experience past it accumulates without further level-ups
pub const MAX_SKILL_LEVEL: u32 = 100_000;

/// Combinatorial curve base used by the fist skill
pub const FIST_BASE_XP: f64 = 80.0;
