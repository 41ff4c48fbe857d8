//! Combat orchestrator: owns every attack machine and drives hit checks.

use bevy::math::Vec2;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::attack::AttackStateMachine;
use super::fist::ClickRateTracker;
use super::{AttackSource, CombatConfig, CombatDeps, HitRecord, SourceId, SwingView, WeaponKind};
use crate::constants::SWING_VOLUME;
use crate::error::SimError;
use crate::scheduler::TickScheduler;

/// Mid-swing hit check waiting on the scheduler
#[derive(Debug, Clone, PartialEq)]
struct PendingCheck {
    source: SourceId,
    weapon: WeaponKind,
    attack_id: String,
}

#[derive(Debug, Default)]
pub struct CombatOrchestrator {
    config: CombatConfig,
    machines: HashMap<(SourceId, WeaponKind), AttackStateMachine>,
    clicks: HashMap<SourceId, ClickRateTracker>,
    sources: HashMap<SourceId, AttackSource>,
    scheduler: TickScheduler<PendingCheck>,
    hit_log: Vec<HitRecord>,
}

impl CombatOrchestrator {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Swaps tuning. Existing machines are retuned in place, so running
    /// cooldowns and swings in flight survive a reload.
    pub fn set_config(&mut self, config: CombatConfig) {
        for ((_, weapon), machine) in self.machines.iter_mut() {
            machine.retune(config.weapons.get(*weapon).clone(), &config.fist);
        }
        self.config = config;
    }

    /// Starts a swing and resolves its immediate hit. Returns false for
    /// unknown weapons, unmet level requirements and swings still on
    /// cooldown; none of those touch the world.
    pub fn start_attack(
        &mut self,
        weapon_name: &str,
        direction: f32,
        source: AttackSource,
        now: u64,
        deps: &mut CombatDeps<'_>,
    ) -> bool {
        let weapon = match weapon_name.parse::<WeaponKind>() {
            Ok(weapon) => weapon,
            Err(err) => {
                warn!(%err, source = %source.id, "attack rejected");
                return false;
            }
        };
        if !direction.is_finite() {
            warn!(source = %source.id, weapon = %weapon, "attack rejected: non-finite direction");
            return false;
        }

        let profile = self.config.weapons.get(weapon);
        let level = source.levels.get(&profile.skill);
        if level < profile.required_level {
            let err = SimError::RequirementNotMet {
                skill: profile.skill.clone(),
                required: profile.required_level,
                current: level,
            };
            warn!(%err, source = %source.id, weapon = %weapon, "attack rejected");
            return false;
        }

        let window = self.config.fist.click_window_ms;
        let tracker = self
            .clicks
            .entry(source.id)
            .or_insert_with(|| ClickRateTracker::new(window));
        tracker.record(now);
        let cps = tracker.clicks_per_second(now);

        let machine = self
            .machines
            .entry((source.id, weapon))
            .or_insert_with(|| {
                AttackStateMachine::new(source.id, profile.clone(), &self.config.fist)
            });

        let Some(instance) = machine.start(direction, &source, now, cps) else {
            return false;
        };
        let check = PendingCheck {
            source: source.id,
            weapon,
            attack_id: instance.id.clone(),
        };
        let hit_check_ms = instance.hit_check_ms;
        deps.hooks.play_sound(&profile.swing_sound, SWING_VOLUME);

        let records = machine.resolve_hit(&source, now, deps);
        self.hit_log.extend(records);
        self.scheduler.schedule(hit_check_ms, check);
        self.sources.insert(source.id, source);
        true
    }

    /// Latest position/stats of a source, used by its pending hit checks.
    pub fn update_source(&mut self, source: AttackSource) {
        self.sources.insert(source.id, source);
    }

    pub fn update(&mut self, dt_ms: f32, now: u64, deps: &mut CombatDeps<'_>) {
        for check in self.scheduler.drain_due(now) {
            let Some(machine) = self.machines.get_mut(&(check.source, check.weapon)) else {
                continue;
            };
            if !machine.is_active_instance(&check.attack_id) {
                debug!(attack = %check.attack_id, "stale hit check skipped");
                continue;
            }
            let Some(source) = self.sources.get(&check.source) else {
                continue;
            };
            let records = machine.resolve_hit(source, now, deps);
            self.hit_log.extend(records);
        }

        for machine in self.machines.values_mut() {
            machine.update(dt_ms, now);
        }
    }

    /// Cancels a swing in flight; its pending check becomes a no-op.
    pub fn reset(&mut self, source: SourceId, weapon: WeaponKind) -> bool {
        match self.machines.get_mut(&(source, weapon)) {
            Some(machine) => {
                machine.reset();
                true
            }
            None => false,
        }
    }

    pub fn machine(&self, source: SourceId, weapon: WeaponKind) -> Option<&AttackStateMachine> {
        self.machines.get(&(source, weapon))
    }

    pub fn is_active(&self, source: SourceId, weapon: WeaponKind) -> bool {
        self.machine(source, weapon).is_some_and(AttackStateMachine::is_active)
    }

    pub fn cooldown_remaining(&self, source: SourceId, weapon: WeaponKind) -> f32 {
        self.machine(source, weapon)
            .map(AttackStateMachine::cooldown_remaining)
            .unwrap_or(0.0)
    }

    pub fn clicks_per_second(&mut self, source: SourceId, now: u64) -> f32 {
        self.clicks
            .get_mut(&source)
            .map(|t| t.clicks_per_second(now))
            .unwrap_or(0.0)
    }

    pub fn pending_checks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn hit_log(&self) -> &[HitRecord] {
        &self.hit_log
    }

    pub fn drain_hits(&mut self) -> Vec<HitRecord> {
        std::mem::take(&mut self.hit_log)
    }

    pub fn active_swings(&self, now: u64) -> Vec<SwingView> {
        self.machines
            .iter()
            .filter_map(|((source, _), machine)| {
                let origin = self
                    .sources
                    .get(source)
                    .map(|s| s.position)
                    .unwrap_or(Vec2::ZERO);
                machine.swing_view(origin, now)
            })
            .collect()
    }
}
