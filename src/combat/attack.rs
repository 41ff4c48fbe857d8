//! Per-weapon attack state machine and hit resolution.

use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, trace};

use super::damage::{apply_crit, base_damage};
use super::fist::{FistTechnique, FistTuning};
use super::weapons::WeaponProfile;
use super::{
    AttackInstance, AttackSource, CombatDeps, HitRecord, SourceId, SwingPhase, SwingView,
    TargetCategory, WeaponKind,
};
use crate::constants::NODE_QUERY_MARGIN;
use crate::geometry::{hits_circular_target, hits_square_target, swing_sample_points, HitShape, Swing};
use crate::nodes::{Damageable, NodeCategory, NodeId, ResourceNode};

#[derive(Debug, Clone)]
pub struct AttackStateMachine {
    source: SourceId,
    profile: WeaponProfile,
    fist: Option<FistTechnique>,
    phase: SwingPhase,
    cooldown_ms: f32,
    current: Option<AttackInstance>,
    seq: u64,
}

impl AttackStateMachine {
    pub fn new(source: SourceId, profile: WeaponProfile, fist_tuning: &FistTuning) -> Self {
        let fist = (profile.kind == WeaponKind::Fist).then(|| FistTechnique::new(fist_tuning.clone()));
        Self {
            source,
            profile,
            fist,
            phase: SwingPhase::Idle,
            cooldown_ms: 0.0,
            current: None,
            seq: 0,
        }
    }

    pub fn profile(&self) -> &WeaponProfile {
        &self.profile
    }

    pub fn phase(&self) -> SwingPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SwingPhase::Swinging
    }

    /// True while the given swing is still the one in flight
    pub fn is_active_instance(&self, attack_id: &str) -> bool {
        self.is_active() && self.current.as_ref().is_some_and(|i| i.id == attack_id)
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_ms
    }

    pub fn current(&self) -> Option<&AttackInstance> {
        self.current.as_ref()
    }

    pub fn combo(&self) -> u32 {
        self.fist.as_ref().map(FistTechnique::combo).unwrap_or(0)
    }

    /// Starts a swing unless the cooldown is still running.
    pub fn start(
        &mut self,
        direction: f32,
        source: &AttackSource,
        now: u64,
        clicks_per_second: f32,
    ) -> Option<&AttackInstance> {
        if self.cooldown_ms > 0.0 {
            trace!(source = %self.source, weapon = %self.profile.kind, remaining = self.cooldown_ms, "on cooldown");
            return None;
        }

        let profile = &self.profile;
        let (cooldown, range, shape, crit_chance) = match (&mut self.fist, profile.shape) {
            (Some(technique), HitShape::Rect { width }) => {
                let swing = technique.begin_swing(
                    now,
                    clicks_per_second,
                    source.levels.fist,
                    profile.cooldown_ms,
                    profile.range,
                    width,
                );
                (
                    swing.cooldown_ms,
                    swing.range,
                    HitShape::Rect { width: swing.width },
                    swing.crit_chance,
                )
            }
            (Some(technique), shape) => {
                let swing = technique.begin_swing(
                    now,
                    clicks_per_second,
                    source.levels.fist,
                    profile.cooldown_ms,
                    profile.range,
                    0.0,
                );
                (swing.cooldown_ms, swing.range, shape, swing.crit_chance)
            }
            (None, shape) => (profile.cooldown_ms, profile.range, shape, 0.0),
        };

        self.seq += 1;
        self.cooldown_ms = cooldown;
        self.phase = SwingPhase::Swinging;
        self.current = Some(AttackInstance {
            id: format!("{}-{}-{}", self.source, profile.kind, self.seq),
            weapon: profile.kind,
            direction,
            source: self.source,
            start_ms: now,
            end_ms: now + profile.duration_ms.max(0.0).round() as u64,
            hit_check_ms: now + profile.hit_check_offset_ms(),
            hit_set: HashSet::new(),
            range,
            angle_width: profile.angle_width,
            shape,
            crit_chance,
        });
        self.current.as_ref()
    }

    pub fn update(&mut self, dt_ms: f32, now: u64) {
        self.cooldown_ms = (self.cooldown_ms - dt_ms).max(0.0);

        let finished = self
            .current
            .as_ref()
            .is_some_and(|inst| now >= inst.end_ms);
        if self.phase == SwingPhase::Swinging && finished {
            self.phase = SwingPhase::Idle;
            self.current = None;
        }
    }

    /// Swaps in new tuning. Cooldown, combo and the swing in flight carry over.
    pub fn retune(&mut self, profile: WeaponProfile, fist_tuning: &FistTuning) {
        if let Some(fist) = self.fist.as_mut() {
            fist.tuning = fist_tuning.clone();
        }
        self.profile = profile;
    }

    /// Cancels the swing in flight and clears the cooldown.
    pub fn reset(&mut self) {
        self.phase = SwingPhase::Idle;
        self.current = None;
        self.cooldown_ms = 0.0;
        if let Some(fist) = self.fist.as_mut() {
            fist.reset();
        }
    }

    pub fn swing_view(&self, origin: bevy::math::Vec2, now: u64) -> Option<SwingView> {
        let inst = self.current.as_ref().filter(|_| self.is_active())?;
        Some(SwingView {
            origin,
            range: inst.range,
            direction: inst.direction,
            angle_width: inst.angle_width,
            shape: inst.shape,
            progress: inst.progress(now),
        })
    }

    /// Runs the hit test for the swing in flight and applies damage,
    /// experience, effects and drops. Nodes already in the swing's hit set
    /// are skipped, so the immediate and the scheduled check never
    /// double-hit.
    pub fn resolve_hit(
        &mut self,
        source: &AttackSource,
        now: u64,
        deps: &mut CombatDeps<'_>,
    ) -> Vec<HitRecord> {
        if self.phase != SwingPhase::Swinging {
            return Vec::new();
        }
        let Some(instance) = self.current.as_mut() else {
            return Vec::new();
        };

        let origin = source.position;
        let swing = instance.swing(origin, deps.player_radius);
        let query_radius = swing.range + NODE_QUERY_MARGIN + deps.player_radius * 2.0;

        let mut targets: Vec<(NodeId, TargetCategory, f32)> = Vec::new();
        for node in deps.nodes.nodes_in_radius(origin, query_radius) {
            let category = TargetCategory::from(node.category());
            if !self.profile.reaches(category) || instance.hit_set.contains(&node.id) {
                continue;
            }
            if swing_hits_node(&swing, origin, node) {
                targets.push((node.id, category, node.position.distance_squared(origin)));
            }
        }
        if self.profile.reaches(TargetCategory::Enemy) {
            trace!(attack = %instance.id, "enemy targets are not resolved by the node layer");
        }

        targets.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)));
        targets.truncate(self.profile.max_targets(&source.levels));

        targets
            .into_iter()
            .filter_map(|(id, category, _)| {
                strike(&self.profile, instance, source, id, category, now, deps)
            })
            .collect()
    }
}

fn swing_hits_node(swing: &Swing, origin: bevy::math::Vec2, node: &ResourceNode) -> bool {
    match node.category() {
        NodeCategory::Ore => hits_circular_target(origin, &node.as_circle(), swing),
        NodeCategory::Tree => {
            let square = node.as_square();
            let mut points = swing_sample_points(origin, swing);
            if points.is_empty() {
                points.push(origin + crate::geometry::direction_vector(swing.direction) * swing.range);
            }
            points
                .into_iter()
                .any(|p| hits_square_target(p, &square, Some(origin), swing.player_radius))
        }
    }
}

fn strike(
    profile: &WeaponProfile,
    instance: &mut AttackInstance,
    source: &AttackSource,
    id: NodeId,
    category: TargetCategory,
    now: u64,
    deps: &mut CombatDeps<'_>,
) -> Option<HitRecord> {
    let crit = instance.crit_chance > 0.0 && deps.rng.gen::<f32>() < instance.crit_chance;
    let damage = apply_crit(base_damage(profile, category, source), crit);

    let Some(node) = deps.nodes.get_mut(id) else {
        debug!(id, "target gone before hit landed");
        return None;
    };
    let outcome = node.apply_damage(damage, source.id);
    if outcome.ignored {
        return None;
    }
    instance.hit_set.insert(id);
    node.shake(now);
    let (position, kind, level) = (node.position, node.kind, node.level);

    deps.effects.push_damage(position, damage, crit, now);
    deps.hooks.play_sound(kind.hit_sound(), 0.6);
    if source.grants_experience {
        deps.skills.add_experience(&profile.skill, profile.xp_per_hit);
    }

    if outcome.destroyed {
        info!(id, kind = kind.display_name(), weapon = %profile.kind, "node broken");
        if source.grants_experience {
            deps.skills
                .add_experience(&profile.skill, profile.destroy_bonus_xp);
        }
        deps.orbs
            .create_burst(position, kind.orb_reward(level), now, &mut *deps.rng);
        deps.hooks.play_sound(kind.break_sound(), 1.0);
        if source.grants_experience {
            deps.hooks
                .post_system_message(&format!("You harvested {}.", kind.display_name()));
        }
        deps.nodes.on_destroyed(id, now);
    }

    Some(HitRecord {
        attack_id: instance.id.clone(),
        source: source.id,
        weapon: profile.kind,
        target: id,
        category,
        damage,
        crit,
        destroyed: outcome.destroyed,
        at_ms: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::weapons::{axe, fist, pickaxe};
    use crate::effects::EffectQueue;
    use crate::hooks::Hooks;
    use crate::nodes::{NodeKind, NodeManager, OreType, TreeType};
    use crate::orbs::OrbEconomy;
    use crate::skills::{SkillBook, MINING};
    use crate::SimRng;
    use bevy::math::Vec2;
    use rand::SeedableRng;

    struct Fixture {
        nodes: NodeManager,
        orbs: OrbEconomy,
        skills: SkillBook,
        effects: EffectQueue,
        hooks: Hooks,
        rng: SimRng,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                nodes: NodeManager::default(),
                orbs: OrbEconomy::default(),
                skills: SkillBook::default(),
                effects: EffectQueue::default(),
                hooks: Hooks::default(),
                rng: SimRng::seed_from_u64(1),
            }
        }

        fn deps(&mut self) -> CombatDeps<'_> {
            CombatDeps {
                nodes: &mut self.nodes,
                orbs: &mut self.orbs,
                skills: &mut self.skills,
                effects: &mut self.effects,
                hooks: &self.hooks,
                rng: &mut self.rng,
                player_radius: 20.0,
            }
        }
    }

    fn machine(profile: WeaponProfile) -> AttackStateMachine {
        AttackStateMachine::new(SourceId(1), profile, &FistTuning::default())
    }

    #[test]
    fn test_cooldown_gate() {
        let mut m = machine(pickaxe());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        assert!(m.start(0.0, &src, 0, 0.0).is_some());
        assert!(m.start(0.0, &src, 10, 0.0).is_none());

        m.update(599.0, 599);
        assert!(m.start(0.0, &src, 599, 0.0).is_none());
        m.update(1.0, 600);
        assert!(m.start(0.0, &src, 600, 0.0).is_some());
    }

    #[test]
    fn test_swing_returns_to_idle() {
        let mut m = machine(axe());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        let inst = m.start(1.0, &src, 1000, 0.0).unwrap();
        assert_eq!(inst.hit_check_ms, 1225);
        assert_eq!(inst.end_ms, 1450);
        assert_eq!(inst.id, "src1-axe-1");

        m.update(200.0, 1200);
        assert!(m.is_active());
        m.update(250.0, 1450);
        assert!(!m.is_active());
        assert!(m.current().is_none());
        // Cooldown outlasts the swing
        assert!(m.cooldown_remaining() > 0.0);
    }

    #[test]
    fn test_cooldown_floor_at_zero() {
        let mut m = machine(pickaxe());
        m.update(10_000.0, 10_000);
        assert_eq!(m.cooldown_remaining(), 0.0);
    }

    #[test]
    fn test_resolve_hits_ore_once() {
        let mut fx = Fixture::new();
        let rock = fx.nodes.spawn_node(NodeKind::Ore(OreType::Iron), Vec2::new(40.0, 0.0));
        let mut m = machine(pickaxe());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        m.start(0.0, &src, 0, 0.0);

        let hits = m.resolve_hit(&src, 0, &mut fx.deps());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, rock);
        assert!(m.current().unwrap().hit_set.contains(&rock));

        // Second check in the same swing skips it
        assert!(m.resolve_hit(&src, 360, &mut fx.deps()).is_empty());
        assert_eq!(fx.effects.len(), 1);
        assert_eq!(fx.skills.get(MINING).unwrap().total_experience, 2.0);
    }

    #[test]
    fn test_resolve_when_idle_is_noop() {
        let mut fx = Fixture::new();
        fx.nodes.spawn_node(NodeKind::Ore(OreType::Stone), Vec2::new(30.0, 0.0));
        let mut m = machine(pickaxe());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        assert!(m.resolve_hit(&src, 0, &mut fx.deps()).is_empty());
    }

    #[test]
    fn test_axe_target_cap() {
        let mut fx = Fixture::new();
        for i in 0..3 {
            let angle = -0.6 + 0.6 * i as f32;
            fx.nodes.spawn_node(
                NodeKind::Tree(TreeType::Pine),
                Vec2::new(angle.cos(), angle.sin()) * 60.0,
            );
        }
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);

        let mut m = machine(axe());
        m.start(0.0, &src, 0, 0.0);
        assert_eq!(m.resolve_hit(&src, 0, &mut fx.deps()).len(), 1);

        let skilled = src.clone().with_levels(crate::combat::SkillLevels {
            woodcutting: 10,
            ..Default::default()
        });
        let mut m = machine(axe());
        m.start(0.0, &skilled, 0, 0.0);
        assert_eq!(m.resolve_hit(&skilled, 0, &mut fx.deps()).len(), 3);
    }

    #[test]
    fn test_destroy_spawns_orbs_and_placeholder() {
        let mut fx = Fixture::new();
        let rock = fx.nodes.spawn_node(NodeKind::Ore(OreType::Stone), Vec2::new(30.0, 0.0));
        let src = AttackSource::new(SourceId(1), Vec2::ZERO).with_strength(100.0);
        let mut m = machine(pickaxe());
        m.start(0.0, &src, 0, 0.0);

        let hits = m.resolve_hit(&src, 0, &mut fx.deps());
        assert!(hits[0].destroyed);
        assert!(fx.nodes.get(rock).is_none());
        assert_eq!(fx.nodes.placeholders().count(), 1);
        assert_eq!(fx.orbs.pending_value(), NodeKind::Ore(OreType::Stone).orb_reward(1) as u64);
        assert_eq!(fx.skills.get(MINING).unwrap().total_experience, 12.0);
    }

    #[test]
    fn test_remote_source_grants_no_xp() {
        let mut fx = Fixture::new();
        fx.nodes.spawn_node(NodeKind::Ore(OreType::Stone), Vec2::new(30.0, 0.0));
        let src = AttackSource::new(SourceId(9), Vec2::ZERO).remote();
        let mut m = AttackStateMachine::new(SourceId(9), pickaxe(), &FistTuning::default());
        m.start(0.0, &src, 0, 0.0);
        assert_eq!(m.resolve_hit(&src, 0, &mut fx.deps()).len(), 1);
        assert_eq!(fx.skills.total_experience(), 0.0);
    }

    #[test]
    fn test_reach_limits_target_categories() {
        let mut fx = Fixture::new();
        let rock = fx.nodes.spawn_node(NodeKind::Ore(OreType::Stone), Vec2::new(30.0, 0.0));
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);

        let mut trees_only = pickaxe();
        trees_only.reach = vec![TargetCategory::Tree];
        let mut m = machine(trees_only);
        m.start(0.0, &src, 0, 0.0);
        assert!(m.resolve_hit(&src, 0, &mut fx.deps()).is_empty());
        assert!(!m.current().unwrap().hit_set.contains(&rock));

        let mut m = machine(pickaxe());
        m.start(0.0, &src, 0, 0.0);
        assert_eq!(m.resolve_hit(&src, 0, &mut fx.deps())[0].target, rock);
    }

    #[test]
    fn test_retune_keeps_cooldown_and_swing() {
        let mut m = machine(pickaxe());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        let id = m.start(0.0, &src, 0, 0.0).unwrap().id.clone();

        let mut faster = pickaxe();
        faster.cooldown_ms = 100.0;
        faster.range = 90.0;
        m.retune(faster, &FistTuning::default());

        assert_eq!(m.profile().range, 90.0);
        assert_eq!(m.cooldown_remaining(), 600.0);
        assert!(m.is_active_instance(&id));
        assert!(m.start(0.0, &src, 10, 0.0).is_none());

        // New cooldown applies from the next swing
        m.update(600.0, 600);
        m.start(0.0, &src, 600, 0.0);
        assert_eq!(m.cooldown_remaining(), 100.0);
    }

    #[test]
    fn test_fist_buffs_apply_to_instance() {
        let mut m = machine(fist());
        let src = AttackSource::new(SourceId(1), Vec2::ZERO);
        let slow = m.start(0.0, &src, 0, 0.0).unwrap().clone();
        m.reset();
        let fast = m.start(0.0, &src, 10, 10.0).unwrap().clone();
        assert!(fast.range > slow.range);
        assert!(fast.crit_chance > slow.crit_chance);
        match (slow.shape, fast.shape) {
            (HitShape::Rect { width: a }, HitShape::Rect { width: b }) => assert!(b > a),
            other => panic!("unexpected shapes {other:?}"),
        }
        assert!(m.cooldown_remaining() < fist().cooldown_ms);
    }
}
