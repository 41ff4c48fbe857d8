//! Fist technique: click-rate tracking, combo counter, adaptive cooldown.
//!
//! Sustained fast clicking shortens the cooldown (down to a floor), widens
//! and lengthens the punch box and raises crit chance. Re-attacking inside
//! the combo window widens the box further.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FistTuning {
    pub click_window_ms: u64,
    pub min_cooldown_ms: f32,
    /// Clicks per second above which the cooldown starts shrinking
    pub fast_click_cps: f32,
    pub cooldown_reduction_per_cps: f32,
    pub range_bonus_per_cps: f32,
    pub max_range_bonus: f32,
    pub width_bonus_per_cps: f32,
    pub max_width_bonus: f32,
    pub combo_window_ms: u64,
    pub max_combo: u32,
    pub combo_width_per_step: f32,
    pub crit_per_cps: f32,
    pub crit_per_level: f32,
    pub max_crit_chance: f32,
}

impl Default for FistTuning {
    fn default() -> Self {
        Self {
            click_window_ms: 1000,
            min_cooldown_ms: 100.0,
            fast_click_cps: 4.0,
            cooldown_reduction_per_cps: 20.0,
            range_bonus_per_cps: 1.5,
            max_range_bonus: 15.0,
            width_bonus_per_cps: 2.0,
            max_width_bonus: 20.0,
            combo_window_ms: 500,
            max_combo: 5,
            combo_width_per_step: 4.0,
            crit_per_cps: 0.02,
            crit_per_level: 0.01,
            max_crit_chance: 0.5,
        }
    }
}

/// Sliding window of click timestamps
#[derive(Debug, Clone)]
pub struct ClickRateTracker {
    window_ms: u64,
    clicks: VecDeque<u64>,
}

impl Default for ClickRateTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl ClickRateTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: window_ms.max(1),
            clicks: VecDeque::new(),
        }
    }

    pub fn record(&mut self, now: u64) {
        self.clicks.push_back(now);
        self.evict(now);
    }

    fn evict(&mut self, now: u64) {
        while let Some(&oldest) = self.clicks.front() {
            if now.saturating_sub(oldest) >= self.window_ms {
                self.clicks.pop_front();
            } else {
                break;
            }
        }
    }

    /// Clicks per second over the window ending at `now`
    pub fn clicks_per_second(&mut self, now: u64) -> f32 {
        self.evict(now);
        self.clicks.len() as f32 * 1000.0 / self.window_ms as f32
    }
}

/// Per-swing numbers derived from click rate and combo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FistSwing {
    pub cooldown_ms: f32,
    pub range: f32,
    pub width: f32,
    pub crit_chance: f32,
    pub combo: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FistTechnique {
    pub tuning: FistTuning,
    combo: u32,
    last_start: Option<u64>,
}

impl FistTechnique {
    pub fn new(tuning: FistTuning) -> Self {
        Self {
            tuning,
            combo: 0,
            last_start: None,
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn cooldown(&self, base_ms: f32, cps: f32) -> f32 {
        let t = &self.tuning;
        if cps <= t.fast_click_cps {
            return base_ms;
        }
        let reduced = base_ms - (cps - t.fast_click_cps) * t.cooldown_reduction_per_cps;
        reduced.max(t.min_cooldown_ms.min(base_ms))
    }

    pub fn range(&self, base: f32, cps: f32) -> f32 {
        base + (cps * self.tuning.range_bonus_per_cps).min(self.tuning.max_range_bonus)
    }

    pub fn width(&self, base: f32, cps: f32, combo: u32) -> f32 {
        base + (cps * self.tuning.width_bonus_per_cps).min(self.tuning.max_width_bonus)
            + combo as f32 * self.tuning.combo_width_per_step
    }

    pub fn crit_chance(&self, cps: f32, fist_level: u32) -> f32 {
        let t = &self.tuning;
        (cps * t.crit_per_cps + fist_level as f32 * t.crit_per_level).clamp(0.0, t.max_crit_chance)
    }

    /// Called on a successful start. Advances or resets the combo and
    /// returns the swing parameters.
    pub fn begin_swing(
        &mut self,
        now: u64,
        cps: f32,
        fist_level: u32,
        base_cooldown_ms: f32,
        base_range: f32,
        base_width: f32,
    ) -> FistSwing {
        self.combo = match self.last_start {
            Some(last) if now.saturating_sub(last) <= self.tuning.combo_window_ms => {
                (self.combo + 1).min(self.tuning.max_combo)
            }
            _ => 0,
        };
        self.last_start = Some(now);

        FistSwing {
            cooldown_ms: self.cooldown(base_cooldown_ms, cps),
            range: self.range(base_range, cps),
            width: self.width(base_width, cps, self.combo),
            crit_chance: self.crit_chance(cps, fist_level),
            combo: self.combo,
        }
    }

    pub fn reset(&mut self) {
        self.combo = 0;
        self.last_start = None;
    }
}
