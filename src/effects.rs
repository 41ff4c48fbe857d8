//! Floating damage numbers.

use bevy::math::Vec2;

use crate::constants::{DAMAGE_NUMBER_LIFETIME_MS, DAMAGE_NUMBER_RISE};

#[derive(Debug, Clone, PartialEq)]
pub struct DamageNumber {
    pub position: Vec2,
    pub value: f32,
    pub crit: bool,
    pub created_at: u64,
    pub expires_at: u64,
}

impl DamageNumber {
    /// Position after drifting upward (screen y grows downward)
    pub fn position_at(&self, now: u64) -> Vec2 {
        let secs = now.saturating_sub(self.created_at) as f32 / 1000.0;
        self.position - Vec2::new(0.0, DAMAGE_NUMBER_RISE * secs)
    }

    pub fn alpha_at(&self, now: u64) -> f32 {
        let life = self.expires_at.saturating_sub(self.created_at).max(1) as f32;
        let left = self.expires_at.saturating_sub(now) as f32;
        (left / life).clamp(0.0, 1.0)
    }

    pub fn label(&self) -> String {
        let rounded = (self.value * 10.0).round() / 10.0;
        if self.crit {
            format!("{rounded}!")
        } else {
            format!("{rounded}")
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    numbers: Vec<DamageNumber>,
}

impl EffectQueue {
    pub fn push_damage(&mut self, position: Vec2, value: f32, crit: bool, now: u64) {
        self.numbers.push(DamageNumber {
            position,
            value,
            crit,
            created_at: now,
            expires_at: now + DAMAGE_NUMBER_LIFETIME_MS,
        });
    }

    pub fn expire(&mut self, now: u64) -> usize {
        let before = self.numbers.len();
        self.numbers.retain(|n| n.expires_at > now);
        before - self.numbers.len()
    }

    pub fn numbers(&self) -> &[DamageNumber] {
        &self.numbers
    }

    pub fn drain(&mut self) -> Vec<DamageNumber> {
        std::mem::take(&mut self.numbers)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
