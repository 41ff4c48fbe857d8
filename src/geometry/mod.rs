//! Hit-test geometry for melee swings.
//!
//! Pure functions answering "does a swing from here connect with that".
//! Three swing shapes exist because the weapons feel different:
//! - `Cone`: narrow (pickaxe) or wide (axe) arc measured from the attack origin
//! - `Rect`: box anchored at the source and pointing along the swing (fist)
//! - `Proximity`: only the close-range facing override
//!
//! Every shape also honours the close-range override: a target hugging the
//! source counts as hit whenever the source faces within 90 degrees of it,
//! so melee never whiffs on something the player is standing next to.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Swing shape used by [`hits_circular_target`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    Cone,
    Rect { width: f32 },
    Proximity,
}

/// Circular hurt area (ores, and anything else with health)
#[derive(Debug, Clone, Copy)]
pub struct CircleTarget {
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub broken: bool,
    pub visible: bool,
}

impl CircleTarget {
    pub fn is_hittable(&self) -> bool {
        self.visible && !self.broken && self.health > 0.0
    }
}

/// Square hurt area (trees)
#[derive(Debug, Clone, Copy)]
pub struct SquareTarget {
    pub position: Vec2,
    pub half_size: f32,
    pub chopped: bool,
}

/// Parameters of one swing as seen by the hit tests
#[derive(Debug, Clone, Copy)]
pub struct Swing {
    pub range: f32,
    pub angle_width: f32,
    pub direction: f32,
    pub shape: HitShape,
    /// Position of the attacker; enables the close-range override and anchors `Rect`
    pub source: Option<Vec2>,
    pub player_radius: f32,
}

/// Unit vector for an angle in radians
pub fn direction_vector(direction: f32) -> Vec2 {
    Vec2::new(direction.cos(), direction.sin())
}

/// Angle of the line from `from` to `to`
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Signed difference `a - b` wrapped into [-PI, PI]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let mut d = (a - b) % TAU;
    if d > PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    d
}

pub fn point_in_square(point: Vec2, center: Vec2, half_size: f32) -> bool {
    (point.x - center.x).abs() <= half_size && (point.y - center.y).abs() <= half_size
}

/// Close-range override: target edge within two player radii of the source,
/// and the source facing within 90 degrees of it.
fn within_facing_reach(
    source: Vec2,
    facing: f32,
    target: Vec2,
    target_radius: f32,
    player_radius: f32,
) -> bool {
    let dist = source.distance(target);
    if dist - target_radius > player_radius * 2.0 {
        return false;
    }
    if dist <= f32::EPSILON {
        return true;
    }
    angle_diff(angle_between(source, target), facing).abs() <= FRAC_PI_2
}

pub fn hits_circular_target(attack: Vec2, target: &CircleTarget, swing: &Swing) -> bool {
    if !target.is_hittable() {
        return false;
    }

    if let Some(source) = swing.source {
        if within_facing_reach(
            source,
            swing.direction,
            target.position,
            target.radius,
            swing.player_radius,
        ) {
            return true;
        }
    }

    match swing.shape {
        HitShape::Cone => {
            let dist = attack.distance(target.position);
            if dist > swing.range + target.radius {
                return false;
            }
            if dist <= f32::EPSILON {
                return true;
            }
            let off = angle_diff(angle_between(attack, target.position), swing.direction).abs();
            off <= swing.angle_width / 2.0
        }
        HitShape::Rect { width } => {
            let anchor = swing.source.unwrap_or(attack);
            let forward = direction_vector(swing.direction);
            let rel = target.position - anchor;
            let along = rel.dot(forward);
            let across = forward.perp_dot(rel).abs();
            along >= -target.radius
                && along <= swing.range + target.radius
                && across <= width / 2.0 + target.radius
        }
        HitShape::Proximity => false,
    }
}

/// Square hitbox test at a single attack point. The facing used by the
/// close-range override is the direction from the source to the attack point.
pub fn hits_square_target(
    attack: Vec2,
    target: &SquareTarget,
    source: Option<Vec2>,
    player_radius: f32,
) -> bool {
    if target.chopped {
        return false;
    }

    if point_in_square(attack, target.position, target.half_size) {
        return true;
    }

    match source {
        Some(source) => within_facing_reach(
            source,
            angle_between(source, attack),
            target.position,
            target.half_size,
            player_radius,
        ),
        None => false,
    }
}

/// Points swept by a swing, used against square hitboxes.
///
/// Cones sample their arc at full and half range; rects sample the far and
/// middle cross-sections. Proximity swings sweep nothing.
pub fn swing_sample_points(origin: Vec2, swing: &Swing) -> Vec<Vec2> {
    const ARC_SAMPLES: usize = 5;

    match swing.shape {
        HitShape::Cone => {
            let mut points = Vec::with_capacity(ARC_SAMPLES * 2);
            for i in 0..ARC_SAMPLES {
                let t = i as f32 / (ARC_SAMPLES - 1) as f32;
                let angle = swing.direction - swing.angle_width / 2.0 + swing.angle_width * t;
                let dir = direction_vector(angle);
                points.push(origin + dir * swing.range);
                points.push(origin + dir * swing.range * 0.5);
            }
            points
        }
        HitShape::Rect { width } => {
            let anchor = swing.source.unwrap_or(origin);
            let forward = direction_vector(swing.direction);
            let side = forward.perp();
            let mut points = Vec::with_capacity(6);
            for depth in [swing.range, swing.range * 0.5] {
                for offset in [-width / 2.0, 0.0, width / 2.0] {
                    points.push(anchor + forward * depth + side * offset);
                }
            }
            points
        }
        HitShape::Proximity => Vec::new(),
    }
}
