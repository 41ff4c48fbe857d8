//! End-to-end gameplay scenarios
//!
//! Each test drives the public API the way the client does:
//! - chop a tree with a pickaxe, then wait out its respawn
//! - punch copper at a fast click rate
//! - top up the tree population around the player
//! - level a skill with one large experience grant
//! - burst a node's reward into orbs and collect all of it

use bevy::math::Vec2;
use rand::SeedableRng;

use harvest_core::combat::damage::base_damage;
use harvest_core::combat::weapons::fist;
use harvest_core::combat::{
    AttackSource, CombatDeps, CombatOrchestrator, SkillLevels, SourceId, TargetCategory,
};
use harvest_core::effects::EffectQueue;
use harvest_core::hooks::{Hooks, Tool, ToolProvider};
use harvest_core::nodes::{
    NodeCategory, NodeKind, NodeManager, NodeSlot, OreType, PopulationRule, TreeType,
};
use harvest_core::orbs::OrbEconomy;
use harvest_core::skills::{SkillBook, SkillState, XpCurve};
use harvest_core::{HarvestWorld, SimConfig, SimRng};

// ============================================================
// Helpers
// ============================================================

struct HeavyPickaxe;

impl ToolProvider for HeavyPickaxe {
    fn selected_tool(&self) -> Option<Tool> {
        Some(Tool::new("Heavy Pickaxe", 8.0))
    }
}

fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.nodes.trees.min_count = 0;
    config.nodes.ores.min_count = 0;
    config
}

// ============================================================
// Tree chopped with a pickaxe, then respawned
// ============================================================

#[test]
fn test_pickaxe_chops_tree_and_it_respawns() {
    let mut world = HarvestWorld::new(quiet_config()).with_hooks(Hooks {
        tools: Box::new(HeavyPickaxe),
        ..Default::default()
    });
    let tree = world
        .nodes
        .spawn_node(NodeKind::Tree(TreeType::Oak), Vec2::new(100.0, 100.0));
    world.set_player_position(Vec2::new(60.0, 100.0));

    let mut chopped = false;
    for _ in 0..400 {
        world.start_attack("pickaxe", 0.0);
        let outcome = world.tick(0.05);
        if outcome.destroyed().any(|h| h.target == tree) {
            chopped = true;
            break;
        }
    }
    assert!(chopped, "tree never chopped");
    assert!(world.nodes.get(tree).is_none());
    assert!(matches!(world.nodes.slot(tree), Some(NodeSlot::Pending(_))));

    // Not before the delay
    world.tick(29.0);
    assert!(world.nodes.get(tree).is_none());

    world.tick(1.0);
    let node = world.nodes.get(tree).expect("tree respawned");
    assert_eq!(node.id, tree);
    assert_eq!(node.position, Vec2::new(100.0, 100.0));
    assert_eq!(node.health, node.max_health);
    assert!(!node.broken);
}

// ============================================================
// Fist at 10 clicks per second against copper
// ============================================================

#[test]
fn test_fast_fist_damage_against_copper() {
    let source = AttackSource::new(SourceId(7), Vec2::ZERO).with_strength(4.0);
    let fist_level = source.levels.fist;
    let expected = fist_level as f32 + 2.0;
    assert_eq!(
        base_damage(&fist(), TargetCategory::Ore, &source),
        expected
    );

    let mut nodes = NodeManager::default();
    let rock = nodes.spawn_node(NodeKind::Ore(OreType::Copper), Vec2::new(40.0, 0.0));
    assert_eq!(nodes.get(rock).unwrap().level, 2);

    let mut orbs = OrbEconomy::default();
    let mut skills = SkillBook::default();
    let mut effects = EffectQueue::default();
    let hooks = Hooks::default();
    let mut rng = SimRng::seed_from_u64(3);
    let mut combat = CombatOrchestrator::default();

    // 10 clicks per second for one second
    for i in 0..10u64 {
        let now = i * 100;
        let mut deps = CombatDeps {
            nodes: &mut nodes,
            orbs: &mut orbs,
            skills: &mut skills,
            effects: &mut effects,
            hooks: &hooks,
            rng: &mut rng,
            player_radius: 20.0,
        };
        combat.start_attack("fist", 0.0, source.clone(), now, &mut deps);
        combat.update(100.0, now + 99, &mut deps);
    }

    let hits = combat.hit_log();
    assert!(!hits.is_empty());
    for hit in hits {
        let want = if hit.crit { expected * 2.0 } else { expected };
        assert_eq!(hit.damage, want);
    }
    assert!(combat.clicks_per_second(SourceId(7), 900) >= 9.0);
}

// ============================================================
// Population top-up
// ============================================================

#[test]
fn test_population_top_up_respects_caps() {
    let mut nodes = NodeManager::default();
    // 10 in view
    for i in 0..10 {
        nodes.spawn_node(
            NodeKind::Tree(TreeType::Pine),
            Vec2::new(-600.0 + 130.0 * i as f32, 300.0),
        );
    }
    // 30 far away
    for i in 0..30 {
        nodes.spawn_node(
            NodeKind::Tree(TreeType::Birch),
            Vec2::new(5000.0 + 130.0 * i as f32, 0.0),
        );
    }
    assert_eq!(nodes.total_count(NodeCategory::Tree), 40);

    let rule = PopulationRule::trees();
    let mut rng = SimRng::seed_from_u64(99);
    let spawned = nodes.ensure_population_around(Vec2::ZERO, NodeCategory::Tree, &rule, &mut rng);

    assert!(spawned.len() <= 5);
    assert!(nodes.total_count(NodeCategory::Tree) <= rule.max_total);
    for id in spawned {
        let node = nodes.get(id).unwrap();
        assert!(node.kind.is_tree());
        assert!(node.position.length() <= rule.view_radius + 1.0);
    }
}

#[test]
fn test_population_stops_at_max_total() {
    let mut nodes = NodeManager::default();
    let rule = PopulationRule {
        view_radius: 1000.0,
        min_count: 15,
        max_total: 3,
    };
    let mut rng = SimRng::seed_from_u64(5);
    nodes.ensure_population_around(Vec2::ZERO, NodeCategory::Ore, &rule, &mut rng);
    nodes.ensure_population_around(Vec2::ZERO, NodeCategory::Ore, &rule, &mut rng);
    assert!(nodes.total_count(NodeCategory::Ore) <= 3);
}

// ============================================================
// Skill level-up loop
// ============================================================

#[test]
fn test_large_grant_levels_twice() {
    let curve = XpCurve::default();
    let mut state = SkillState::new(&curve);
    let gained = state.add_experience(250.0, &curve);
    assert_eq!(gained, 2);
    assert_eq!(state.level, 3);
    assert_eq!(state.experience, 40.0);
    assert_eq!(state.max_experience, 121.0);
    assert_eq!(curve.level_from_total_experience(250.0), (3, 40.0));
}

// ============================================================
// Orb burst conservation
// ============================================================

#[test]
fn test_burst_is_fully_collected() {
    let mut economy = OrbEconomy::default();
    let mut rng = SimRng::seed_from_u64(21);
    let center = Vec2::new(10.0, -5.0);
    let ids = economy.create_burst(center, 37, 0, &mut rng);
    assert_eq!(ids.len(), 37);
    assert_eq!(economy.pending_value(), 37);

    let mut granted = 0;
    let mut now = 0;
    for _ in 0..600 {
        now += 16;
        granted += economy.update(Some(center), 0.016, now);
    }
    assert_eq!(granted, 37);
    assert_eq!(economy.total_granted(), 37);
    assert!(economy.is_empty());
}

#[test]
fn test_destroying_ore_drops_its_reward() {
    let mut world = HarvestWorld::new(quiet_config());
    let rock = world
        .nodes
        .spawn_node_at_level(NodeKind::Ore(OreType::Stone), Vec2::new(40.0, 0.0), 1);
    let reward = NodeKind::Ore(OreType::Stone).orb_reward(1);

    let mut destroyed_at = None;
    for _ in 0..400 {
        world.start_attack("pickaxe", 0.0);
        let outcome = world.tick(0.05);
        if outcome.destroyed().any(|h| h.target == rock) {
            destroyed_at = Some(world.now_ms());
            break;
        }
    }
    assert!(destroyed_at.is_some());

    // Orbs spawned next to the player fly in and are collected
    for _ in 0..300 {
        world.tick(1.0 / 60.0);
    }
    assert_eq!(world.orbs.total_granted(), u64::from(reward));
    assert_eq!(world.orbs.pending_value(), 0);
    let levels = SkillLevels::from_book(&world.skills);
    assert!(world.skills.get(harvest_core::skills::MINING).unwrap().total_experience > 0.0);
    assert!(levels.mining >= 1);
}
