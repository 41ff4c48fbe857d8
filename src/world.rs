//! The simulation root.
//!
//! [`HarvestWorld`] owns every manager and lends them to the combat layer
//! for one call at a time. One [`HarvestWorld::tick`] advances the clock and
//! runs combat, node housekeeping, population top-up, orbs and effects in
//! that order.

use bevy::math::Vec2;
use rand::SeedableRng;
use tracing::info;

use crate::combat::{
    AttackSource, CombatDeps, CombatOrchestrator, HitRecord, SkillLevels, SourceId,
};
use crate::config::SimConfig;
use crate::constants::PLAYER_BASE_STRENGTH;
use crate::effects::EffectQueue;
use crate::hooks::Hooks;
use crate::logging::TimingSpan;
use crate::nodes::{NodeCategory, NodeId, NodeManager};
use crate::orbs::OrbEconomy;
use crate::render::{Camera, Drawable, RenderSurface};
use crate::skills::{LevelUp, SkillBook};
use crate::SimRng;

/// The local player as the world sees it
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub id: SourceId,
    pub position: Vec2,
    pub strength: f32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            id: SourceId(1),
            position: Vec2::ZERO,
            strength: PLAYER_BASE_STRENGTH,
        }
    }
}

/// What one tick changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldOutcome {
    pub now_ms: u64,
    pub hits: Vec<HitRecord>,
    pub respawned: Vec<NodeId>,
    pub spawned: Vec<NodeId>,
    pub xp_collected: u32,
    pub level_ups: Vec<LevelUp>,
    pub effects_expired: usize,
}

impl WorldOutcome {
    pub fn destroyed(&self) -> impl Iterator<Item = &HitRecord> {
        self.hits.iter().filter(|h| h.destroyed)
    }
}

#[derive(Debug)]
pub struct HarvestWorld {
    config: SimConfig,
    clock_ms: f64,
    pub nodes: NodeManager,
    pub orbs: OrbEconomy,
    pub skills: SkillBook,
    pub effects: EffectQueue,
    pub combat: CombatOrchestrator,
    pub hooks: Hooks,
    pub player: PlayerState,
    rng: SimRng,
}

impl Default for HarvestWorld {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl HarvestWorld {
    pub fn new(config: SimConfig) -> Self {
        Self {
            nodes: NodeManager::new(config.nodes.placement.clone()),
            orbs: OrbEconomy::new(config.orbs.clone()),
            skills: SkillBook::new(&config.skills),
            effects: EffectQueue::default(),
            combat: CombatOrchestrator::new(config.combat.clone()),
            hooks: Hooks::default(),
            player: PlayerState::default(),
            rng: SimRng::seed_from_u64(config.world.seed),
            clock_ms: 0.0,
            config,
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Swaps tuning at runtime. Skill progress, live nodes, orbs and running
    /// cooldowns are kept; skill curves only change for a new world.
    pub fn apply_config(&mut self, config: SimConfig) {
        self.nodes.placement = config.nodes.placement.clone();
        self.orbs.config = config.orbs.clone();
        self.combat.set_config(config.combat.clone());
        self.config = config;
        info!("applied new simulation config");
    }

    pub fn now_ms(&self) -> u64 {
        self.clock_ms as u64
    }

    pub fn set_player_position(&mut self, position: Vec2) {
        self.player.position = position;
    }

    pub fn set_player_strength(&mut self, strength: f32) {
        self.player.strength = strength;
    }

    /// The player as an attack source: current levels and selected tool
    pub fn player_source(&self) -> AttackSource {
        let source = AttackSource::new(self.player.id, self.player.position)
            .with_strength(self.player.strength)
            .with_levels(SkillLevels::from_book(&self.skills));
        match self.hooks.selected_tool() {
            Some(tool) => source.with_tool(tool),
            None => source,
        }
    }

    /// Starts a player swing. False for unknown weapons, unmet
    /// requirements and swings on cooldown.
    pub fn start_attack(&mut self, weapon: &str, direction: f32) -> bool {
        let source = self.player_source();
        self.start_attack_from(weapon, direction, source)
    }

    /// Starts a swing for any source, e.g. a remote player.
    pub fn start_attack_from(&mut self, weapon: &str, direction: f32, source: AttackSource) -> bool {
        let now = self.now_ms();
        let mut deps = CombatDeps {
            nodes: &mut self.nodes,
            orbs: &mut self.orbs,
            skills: &mut self.skills,
            effects: &mut self.effects,
            hooks: &self.hooks,
            rng: &mut self.rng,
            player_radius: self.config.world.player_radius,
        };
        self.combat.start_attack(weapon, direction, source, now, &mut deps)
    }

    pub fn tick(&mut self, dt_secs: f32) -> WorldOutcome {
        let _span = TimingSpan::new("world_tick");
        let dt_secs = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        let dt_ms = dt_secs * 1000.0;
        self.clock_ms += dt_ms as f64;
        let now = self.now_ms();
        let mut outcome = WorldOutcome {
            now_ms: now,
            ..Default::default()
        };

        // Pending checks use where the player is now
        self.combat.update_source(self.player_source());
        {
            let mut deps = CombatDeps {
                nodes: &mut self.nodes,
                orbs: &mut self.orbs,
                skills: &mut self.skills,
                effects: &mut self.effects,
                hooks: &self.hooks,
                rng: &mut self.rng,
                player_radius: self.config.world.player_radius,
            };
            self.combat.update(dt_ms, now, &mut deps);
        }
        outcome.hits = self.combat.drain_hits();

        let report = self.nodes.update(now);
        outcome.respawned = report.respawned;

        let reference = self.player.position;
        for (category, rule) in [
            (NodeCategory::Tree, &self.config.nodes.trees),
            (NodeCategory::Ore, &self.config.nodes.ores),
        ] {
            let spawned = self
                .nodes
                .ensure_population_around(reference, category, rule, &mut self.rng);
            outcome.spawned.extend(spawned);
        }

        let granted = self.orbs.update(Some(reference), dt_secs, now);
        if granted > 0 {
            self.skills
                .add_experience(&self.config.orb_skill, f64::from(granted));
        }
        outcome.xp_collected = granted;

        for level_up in self.skills.drain_level_ups() {
            info!(skill = %level_up.skill, level = level_up.level, "level up");
            self.hooks.notify_level_up(&level_up.skill, level_up.level);
            self.hooks.post_system_message(&format!(
                "Your {} level is now {}.",
                level_up.skill, level_up.level
            ));
            outcome.level_ups.push(level_up);
        }

        outcome.effects_expired = self.effects.expire(now);
        outcome
    }

    /// Draws nodes, orbs, active swings and damage numbers, back to front.
    pub fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera) {
        let now = self.now_ms();
        for node in self.nodes.iter_live() {
            node.draw(surface, camera, now);
        }
        for orb in self.orbs.orbs() {
            orb.draw(surface, camera, now);
        }
        for swing in self.combat.active_swings(now) {
            swing.draw(surface, camera, now);
        }
        for number in self.effects.numbers() {
            number.draw(surface, camera, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{SkillUiNotifier, SystemMessageSink, Tool, ToolProvider};
    use crate::nodes::{NodeKind, OreType, TreeType};
    use crate::render::CommandBuffer;
    use crate::skills::{MINING, PLAYER};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl SkillUiNotifier for Recorder {
        fn notify_level_up(&self, skill: &str, level: u32) {
            self.0.lock().unwrap().push(format!("ui:{skill}:{level}"));
        }
    }

    impl SystemMessageSink for Recorder {
        fn post_system_message(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    struct Pickaxe;

    impl ToolProvider for Pickaxe {
        fn selected_tool(&self) -> Option<Tool> {
            Some(Tool::new("iron_pickaxe", 3.0))
        }
    }

    fn empty_world() -> HarvestWorld {
        let mut config = SimConfig::default();
        config.nodes.trees.min_count = 0;
        config.nodes.ores.min_count = 0;
        HarvestWorld::new(config)
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut world = empty_world();
        world.tick(0.5);
        world.tick(0.25);
        assert_eq!(world.now_ms(), 750);
        world.tick(f32::NAN);
        world.tick(-1.0);
        assert_eq!(world.now_ms(), 750);
    }

    #[test]
    fn test_first_tick_populates() {
        let mut world = HarvestWorld::default();
        let outcome = world.tick(1.0 / 60.0);
        assert!(!outcome.spawned.is_empty());
        assert!(world.nodes.live_count(NodeCategory::Tree) <= world.config().nodes.trees.max_total);
        assert!(world.nodes.live_count(NodeCategory::Ore) <= world.config().nodes.ores.max_total);
    }

    #[test]
    fn test_seeded_worlds_match() {
        let mut a = HarvestWorld::default();
        let mut b = HarvestWorld::default();
        a.tick(0.1);
        b.tick(0.1);
        let pa: Vec<_> = a.nodes.iter_live().map(|n| (n.position, n.kind)).collect();
        let pb: Vec<_> = b.nodes.iter_live().map(|n| (n.position, n.kind)).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_player_attack_uses_selected_tool() {
        let mut world = empty_world().with_hooks(Hooks {
            tools: Box::new(Pickaxe),
            ..Default::default()
        });
        let source = world.player_source();
        assert_eq!(source.tool.map(|t| t.stats.strength), Some(3.0));
        assert!(world.start_attack("pickaxe", 0.0));
        assert!(!world.start_attack("pickaxe", 0.0));
        assert!(!world.start_attack("trowel", 0.0));
    }

    #[test]
    fn test_mining_grants_xp_and_orbs() {
        let mut world = empty_world();
        let rock = world
            .nodes
            .spawn_node_at_level(NodeKind::Ore(OreType::Stone), Vec2::new(40.0, 0.0), 1);

        let mut destroyed = false;
        for _ in 0..200 {
            world.start_attack("pickaxe", 0.0);
            let outcome = world.tick(0.05);
            if outcome.destroyed().any(|h| h.target == rock) {
                destroyed = true;
                break;
            }
        }
        assert!(destroyed);
        assert!(world.skills.get(MINING).unwrap().total_experience > 0.0);
        assert!(world.orbs.pending_value() > 0 || world.orbs.total_granted() > 0);
    }

    #[test]
    fn test_orbs_feed_player_skill_and_notify() {
        let recorder = Recorder::default();
        let mut world = empty_world().with_hooks(Hooks {
            skill_ui: Box::new(recorder.clone()),
            messages: Box::new(recorder.clone()),
            ..Default::default()
        });
        world.orbs.spawn(Vec2::new(5.0, 0.0), 150, 0);

        let mut collected = 0;
        let mut level_ups = Vec::new();
        for _ in 0..120 {
            let outcome = world.tick(1.0 / 60.0);
            collected += outcome.xp_collected;
            level_ups.extend(outcome.level_ups);
        }
        assert_eq!(collected, 150);
        assert_eq!(world.skills.get(PLAYER).unwrap().total_experience, 150.0);
        assert_eq!(level_ups.len(), 1);

        let log = recorder.0.lock().unwrap();
        assert!(log.contains(&format!("ui:{PLAYER}:2")));
        assert!(log.iter().any(|m| m.contains("level is now 2")));
    }

    #[test]
    fn test_apply_config_keeps_progress() {
        let mut world = empty_world();
        world.skills.add_experience(MINING, 500.0);
        let mut config = world.config().clone();
        config.orbs.merge_distance = 30.0;
        config.world.seed = 1234;
        world.apply_config(config);
        assert_eq!(world.orbs.config.merge_distance, 30.0);
        assert!(world.skills.level(MINING) > 1);
    }

    #[test]
    fn test_draw_emits_commands() {
        let mut world = empty_world();
        world
            .nodes
            .spawn_node(NodeKind::Tree(TreeType::Oak), Vec2::new(100.0, 100.0));
        world.orbs.spawn(Vec2::new(50.0, 50.0), 10, 0);
        world.start_attack("axe", 0.0);

        let mut buffer = CommandBuffer::default();
        let camera = Camera::centered_on(Vec2::ZERO, Vec2::new(800.0, 600.0));
        world.draw(&mut buffer, &camera);
        assert!(buffer.commands.len() >= 3);
    }
}
