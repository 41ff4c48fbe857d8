//! Experience orb economy.
//!
//! Orbs drop from destroyed nodes, drift toward the collector once inside the
//! magnet radius, merge with close neighbours and grant their amount when
//! picked up. Uncollected orbs fade out and expire without granting anything.

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::debug;

use crate::constants::*;

pub type OrbId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub max_value: u32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub magnet_distance: f32,
    pub magnet_strength: f32,
    pub max_speed: f32,
    pub damping: f32,
    pub magnet_damping: f32,
    pub collection_distance: f32,
    pub merge_distance: f32,
    pub lifetime_ms: u64,
    pub fade_out_ms: u64,
    pub collect_anim_ms: u64,
    pub burst_ring_min: f32,
    pub burst_ring_max: f32,
    pub burst_speed: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_value: ORB_MAX_VALUE,
            min_radius: ORB_MIN_RADIUS,
            max_radius: ORB_MAX_RADIUS,
            magnet_distance: ORB_MAGNET_DISTANCE,
            magnet_strength: ORB_MAGNET_STRENGTH,
            max_speed: ORB_MAX_SPEED,
            damping: ORB_DAMPING,
            magnet_damping: ORB_MAGNET_DAMPING,
            collection_distance: ORB_COLLECTION_DISTANCE,
            merge_distance: ORB_MERGE_DISTANCE,
            lifetime_ms: ORB_LIFETIME_MS,
            fade_out_ms: ORB_FADE_OUT_MS,
            collect_anim_ms: ORB_COLLECT_ANIM_MS,
            burst_ring_min: ORB_BURST_RING_MIN,
            burst_ring_max: ORB_BURST_RING_MAX,
            burst_speed: ORB_BURST_SPEED,
        }
    }
}

impl OrbConfig {
    /// Visual radius grows with ln(amount)
    pub fn radius_for(&self, amount: u32) -> f32 {
        let max_ln = (self.max_value.max(2) as f32).ln();
        let t = ((amount.max(1) as f32).ln() / max_ln).clamp(0.0, 1.0);
        self.min_radius + (self.max_radius - self.min_radius) * t
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceOrb {
    pub id: OrbId,
    pub position: Vec2,
    pub amount: u32,
    pub created_at: u64,
    pub expires_at: u64,
    pub collected: bool,
    pub collected_at: Option<u64>,
    /// Merged into another orb; removed without animation
    pub absorbed: bool,
    pub velocity: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

/// Outcome of advancing one orb
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrbStep {
    pub remove: bool,
    pub granted: u32,
}

/// Velocity retention per 60 Hz frame, scaled to an arbitrary dt
fn damp(velocity: Vec2, factor: f32, dt: f32) -> Vec2 {
    velocity * factor.powf(dt * 60.0)
}

pub fn update_orb(
    orb: &mut ExperienceOrb,
    config: &OrbConfig,
    collector: Option<Vec2>,
    dt: f32,
    now: u64,
) -> OrbStep {
    if orb.absorbed {
        return OrbStep {
            remove: true,
            granted: 0,
        };
    }

    if orb.collected {
        let since = now.saturating_sub(orb.collected_at.unwrap_or(now));
        if since >= config.collect_anim_ms {
            return OrbStep {
                remove: true,
                granted: 0,
            };
        }
        orb.alpha = 1.0 - since as f32 / config.collect_anim_ms.max(1) as f32;
        if let Some(target) = collector {
            orb.position = orb.position.lerp(target, 0.5);
        }
        return OrbStep::default();
    }

    // Magnetism
    let to_collector = collector.map(|c| (c - orb.position, c.distance(orb.position)));
    match to_collector {
        Some((delta, dist)) if dist < config.magnet_distance && dist > f32::EPSILON => {
            let pull = 1.0 - dist / config.magnet_distance;
            orb.velocity += delta / dist * config.magnet_strength * pull * dt;
            orb.velocity = damp(orb.velocity, config.magnet_damping, dt);
        }
        _ => orb.velocity = damp(orb.velocity, config.damping, dt),
    }
    orb.velocity = orb.velocity.clamp_length_max(config.max_speed);
    orb.position += orb.velocity * dt;

    // Expiry
    if now.saturating_sub(orb.created_at) >= config.lifetime_ms {
        return OrbStep {
            remove: true,
            granted: 0,
        };
    }

    // Collection
    if let Some(c) = collector {
        if c.distance(orb.position) <= config.collection_distance {
            orb.collected = true;
            orb.collected_at = Some(now);
            return OrbStep {
                remove: false,
                granted: orb.amount,
            };
        }
    }

    // Fade
    let remaining = orb.expires_at.saturating_sub(now);
    orb.alpha = if remaining < config.fade_out_ms {
        remaining as f32 / config.fade_out_ms.max(1) as f32
    } else {
        1.0
    };

    OrbStep::default()
}

#[derive(Debug, Clone)]
pub struct OrbEconomy {
    pub config: OrbConfig,
    orbs: Vec<ExperienceOrb>,
    next_id: OrbId,
    total_granted: u64,
}

impl Default for OrbEconomy {
    fn default() -> Self {
        Self::new(OrbConfig::default())
    }
}

impl OrbEconomy {
    pub fn new(config: OrbConfig) -> Self {
        Self {
            config,
            orbs: Vec::new(),
            next_id: 1,
            total_granted: 0,
        }
    }

    pub fn orbs(&self) -> &[ExperienceOrb] {
        &self.orbs
    }

    pub fn len(&self) -> usize {
        self.orbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }

    pub fn total_granted(&self) -> u64 {
        self.total_granted
    }

    /// Uncollected orb value still lying around
    pub fn pending_value(&self) -> u64 {
        self.orbs
            .iter()
            .filter(|o| !o.collected)
            .map(|o| o.amount as u64)
            .sum()
    }

    pub fn spawn(&mut self, position: Vec2, amount: u32, now: u64) -> OrbId {
        self.spawn_with_velocity(position, Vec2::ZERO, amount, now)
    }

    pub fn spawn_with_velocity(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        amount: u32,
        now: u64,
    ) -> OrbId {
        let amount = amount.clamp(1, self.config.max_value.max(1));
        let id = self.next_id;
        self.next_id += 1;
        self.orbs.push(ExperienceOrb {
            id,
            position,
            amount,
            created_at: now,
            expires_at: now + self.config.lifetime_ms,
            collected: false,
            collected_at: None,
            absorbed: false,
            velocity,
            radius: self.config.radius_for(amount),
            alpha: 1.0,
        });
        id
    }

    /// One orb of value 1 per experience point, scattered on a ring and
    /// thrown outward.
    pub fn create_burst(
        &mut self,
        position: Vec2,
        total: u32,
        now: u64,
        rng: &mut impl Rng,
    ) -> Vec<OrbId> {
        let (ring_min, ring_max) = (self.config.burst_ring_min, self.config.burst_ring_max);
        let speed = self.config.burst_speed;
        (0..total)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let dist = if ring_max > ring_min {
                    rng.gen_range(ring_min..ring_max)
                } else {
                    ring_min
                };
                let dir = Vec2::new(angle.cos(), angle.sin());
                self.spawn_with_velocity(position + dir * dist, dir * speed, 1, now)
            })
            .collect()
    }

    /// Earlier orbs absorb later ones within merge distance. A merge that
    /// would push an orb over `max_value` is skipped.
    pub fn merge_all(&mut self) -> usize {
        let merge_distance = self.config.merge_distance;
        let max_value = self.config.max_value;
        let mut merged = 0;

        for i in 0..self.orbs.len() {
            if self.orbs[i].collected {
                continue;
            }
            for j in (i + 1)..self.orbs.len() {
                if self.orbs[j].collected {
                    continue;
                }
                if self.orbs[i].position.distance(self.orbs[j].position) > merge_distance {
                    continue;
                }
                let combined = self.orbs[i].amount.saturating_add(self.orbs[j].amount);
                if combined > max_value {
                    continue;
                }

                let absorbed = &mut self.orbs[j];
                absorbed.collected = true;
                absorbed.absorbed = true;

                let keeper = &mut self.orbs[i];
                keeper.amount = combined;
                keeper.radius = self.config.radius_for(combined);
                merged += 1;
            }
        }

        if merged > 0 {
            debug!(merged, "merged experience orbs");
        }
        merged
    }

    /// Advances every orb, merges, then removes finished orbs.
    /// Returns experience granted this tick.
    pub fn update(&mut self, collector: Option<Vec2>, dt: f32, now: u64) -> u32 {
        let mut granted = 0u32;
        let mut remove = vec![false; self.orbs.len()];

        for (orb, flag) in self.orbs.iter_mut().zip(remove.iter_mut()) {
            let step = update_orb(orb, &self.config, collector, dt, now);
            granted = granted.saturating_add(step.granted);
            *flag = step.remove;
            // Finished orbs take no part in this tick's merge
            if step.remove {
                orb.collected = true;
                orb.absorbed = true;
            }
        }

        self.merge_all();

        let mut flags = remove.into_iter();
        self.orbs.retain(|_| !flags.next().unwrap_or(false));

        self.total_granted += granted as u64;
        granted
    }

    pub fn clear(&mut self) {
        self.orbs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn economy() -> OrbEconomy {
        OrbEconomy::new(OrbConfig::default())
    }

    #[test]
    fn test_spawn_clamps_amount() {
        let mut eco = economy();
        eco.spawn(Vec2::ZERO, 0, 0);
        eco.spawn(Vec2::new(100.0, 0.0), 10_000, 0);
        assert_eq!(eco.orbs()[0].amount, 1);
        assert_eq!(eco.orbs()[1].amount, ORB_MAX_VALUE);
    }

    #[test]
    fn test_radius_scales_with_amount() {
        let cfg = OrbConfig::default();
        assert_eq!(cfg.radius_for(1), ORB_MIN_RADIUS);
        assert!((cfg.radius_for(ORB_MAX_VALUE) - ORB_MAX_RADIUS).abs() < 1e-4);
        assert!(cfg.radius_for(10) < cfg.radius_for(100));
    }

    #[test]
    fn test_collection_grants_amount() {
        let mut eco = economy();
        eco.spawn(Vec2::new(10.0, 0.0), 25, 0);
        let granted = eco.update(Some(Vec2::ZERO), 1.0 / 60.0, 16);
        assert_eq!(granted, 25);
        assert!(eco.orbs()[0].collected);

        // Removed once the animation finishes, no second grant
        let granted = eco.update(Some(Vec2::ZERO), 1.0 / 60.0, 16 + ORB_COLLECT_ANIM_MS);
        assert_eq!(granted, 0);
        assert!(eco.is_empty());
        assert_eq!(eco.total_granted(), 25);
    }

    #[test]
    fn test_magnet_pulls_orb() {
        let mut eco = economy();
        eco.spawn(Vec2::new(100.0, 0.0), 5, 0);
        eco.update(Some(Vec2::ZERO), 0.1, 100);
        let orb = &eco.orbs()[0];
        assert!(orb.velocity.x < 0.0);
        assert!(orb.position.x < 100.0);
    }

    #[test]
    fn test_expired_orb_grants_nothing() {
        let mut eco = economy();
        eco.spawn(Vec2::new(500.0, 0.0), 5, 0);
        let granted = eco.update(Some(Vec2::ZERO), 0.016, ORB_LIFETIME_MS);
        assert_eq!(granted, 0);
        assert!(eco.is_empty());
    }

    #[test]
    fn test_fade_near_expiry() {
        let mut eco = economy();
        eco.spawn(Vec2::new(500.0, 0.0), 5, 0);
        eco.update(None, 0.016, ORB_LIFETIME_MS - ORB_FADE_OUT_MS / 2);
        let alpha = eco.orbs()[0].alpha;
        assert!((alpha - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_merge_into_earlier_orb() {
        let mut eco = economy();
        let first = eco.spawn(Vec2::new(0.0, 0.0), 3, 0);
        eco.spawn(Vec2::new(5.0, 0.0), 4, 0);
        eco.spawn(Vec2::new(300.0, 0.0), 1, 0);

        assert_eq!(eco.merge_all(), 1);
        let keeper = eco.orbs().iter().find(|o| o.id == first).unwrap();
        assert_eq!(keeper.amount, 7);
        assert_eq!(keeper.position, Vec2::ZERO);
        assert!(eco.orbs()[1].absorbed);

        // Idempotent
        assert_eq!(eco.merge_all(), 0);
        assert_eq!(eco.pending_value(), 8);
    }

    #[test]
    fn test_merge_respects_cap() {
        let mut eco = economy();
        eco.spawn(Vec2::ZERO, ORB_MAX_VALUE - 1, 0);
        eco.spawn(Vec2::new(1.0, 0.0), 2, 0);
        assert_eq!(eco.merge_all(), 0);
    }

    #[test]
    fn test_burst_spawns_unit_orbs() {
        let mut eco = economy();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let ids = eco.create_burst(Vec2::new(50.0, 50.0), 12, 0, &mut rng);
        assert_eq!(ids.len(), 12);
        for orb in eco.orbs() {
            assert_eq!(orb.amount, 1);
            let d = orb.position.distance(Vec2::new(50.0, 50.0));
            assert!(d >= ORB_BURST_RING_MIN - 1e-3 && d <= ORB_BURST_RING_MAX + 1e-3);
            assert!(orb.velocity.length() > 0.0);
        }
    }

    #[test]
    fn test_collection_beats_merge() {
        let mut eco = economy();
        eco.spawn(Vec2::new(2.0, 0.0), 3, 0);
        eco.spawn(Vec2::new(4.0, 0.0), 4, 0);
        let granted = eco.update(Some(Vec2::ZERO), 0.0, 1);
        assert_eq!(granted, 7);
    }

    #[test]
    fn test_expiring_orb_does_not_absorb_fresh_neighbour() {
        let mut eco = economy();
        let far = Some(Vec2::new(5_000.0, 0.0));
        eco.spawn(Vec2::ZERO, 1, 0);
        let fresh = eco.spawn(Vec2::new(2.0, 0.0), 7, ORB_LIFETIME_MS - 10);

        assert_eq!(eco.update(far, 0.0, ORB_LIFETIME_MS), 0);
        assert_eq!(eco.len(), 1);
        let survivor = &eco.orbs()[0];
        assert_eq!(survivor.id, fresh);
        assert_eq!(survivor.amount, 7);
        assert!(!survivor.collected);
        assert_eq!(eco.pending_value(), 7);

        // Still there on the following tick
        eco.update(far, 0.0, ORB_LIFETIME_MS + 16);
        assert_eq!(eco.pending_value(), 7);
    }

    #[test]
    fn test_expiring_orb_does_not_donate_value() {
        let mut eco = economy();
        let far = Some(Vec2::new(5_000.0, 0.0));
        let keeper = eco.spawn(Vec2::ZERO, 2, 100);
        eco.spawn(Vec2::new(2.0, 0.0), 5, 0);

        eco.update(far, 0.0, ORB_LIFETIME_MS);
        assert_eq!(eco.len(), 1);
        assert_eq!(eco.orbs()[0].id, keeper);
        assert_eq!(eco.orbs()[0].amount, 2);
        assert_eq!(eco.pending_value(), 2);
    }
}
