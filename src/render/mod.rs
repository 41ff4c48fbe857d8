//! Draw-command surface and camera culling.
//!
//! The core never touches a real canvas. Entities implement [`Drawable`]
//! and emit primitives into a [`RenderSurface`]; [`CommandBuffer`] records
//! them for the host (or a test) to replay.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::SwingView;
use crate::constants::CULL_MARGIN;
use crate::effects::DamageNumber;
use crate::geometry::HitShape;
use crate::nodes::{NodeKind, OreType, ResourceNode, TreeType};
use crate::orbs::ExperienceOrb;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World position of the viewport's top-left corner
    pub offset: Vec2,
    pub viewport: Vec2,
    pub cull_margin: f32,
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            viewport,
            cull_margin: CULL_MARGIN,
        }
    }

    /// Camera whose viewport is centered on `focus`
    pub fn centered_on(focus: Vec2, viewport: Vec2) -> Self {
        Self {
            offset: focus - viewport / 2.0,
            ..Self::new(viewport)
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    pub fn is_visible(&self, world: Vec2, radius: f32) -> bool {
        let p = self.world_to_screen(world);
        let m = self.cull_margin + radius;
        p.x >= -m && p.y >= -m && p.x <= self.viewport.x + m && p.y <= self.viewport.y + m
    }
}

pub trait RenderSurface {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Rgba);
    fn stroke_arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32, width: f32, color: Rgba);
    fn draw_text(&mut self, pos: Vec2, text: &str, size: f32, color: Rgba);
}

pub trait Drawable {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera, now: u64);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    Rect {
        min: Vec2,
        size: Vec2,
        color: Rgba,
    },
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Rgba,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: Rgba,
    },
}

#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    pub commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSurface for CommandBuffer {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect { min, size, color });
    }

    fn stroke_arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start,
            end,
            width,
            color,
        });
    }

    fn draw_text(&mut self, pos: Vec2, text: &str, size: f32, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            pos,
            text: text.to_string(),
            size,
            color,
        });
    }
}

// =====================================================
// Palette
// =====================================================

const TRUNK: Rgba = Rgba::rgb(101, 67, 33);
const HEALTH_BG: Rgba = Rgba::rgb(40, 40, 40);
const HEALTH_FG: Rgba = Rgba::rgb(80, 200, 80);
const ORB: Rgba = Rgba::rgb(120, 255, 90);
const DAMAGE: Rgba = Rgba::rgb(255, 255, 255);
const CRIT: Rgba = Rgba::rgb(255, 200, 40);
const SWING: Rgba = Rgba::rgb(255, 255, 255);

fn node_color(kind: NodeKind) -> Rgba {
    match kind {
        NodeKind::Tree(TreeType::Oak) => Rgba::rgb(34, 120, 40),
        NodeKind::Tree(TreeType::Pine) => Rgba::rgb(20, 90, 50),
        NodeKind::Tree(TreeType::Birch) => Rgba::rgb(120, 170, 70),
        NodeKind::Ore(OreType::Stone) => Rgba::rgb(128, 128, 128),
        NodeKind::Ore(OreType::Copper) => Rgba::rgb(184, 115, 51),
        NodeKind::Ore(OreType::Iron) => Rgba::rgb(160, 150, 140),
        NodeKind::Ore(OreType::Gold) => Rgba::rgb(230, 190, 40),
    }
}

impl Drawable for ResourceNode {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera, now: u64) {
        if !self.is_alive() || !camera.is_visible(self.position, self.radius) {
            return;
        }

        let shake = if self.is_shaking(now) {
            // Alternate left/right every 30 ms
            if (now / 30) % 2 == 0 { 2.0 } else { -2.0 }
        } else {
            0.0
        };
        let center = camera.world_to_screen(self.position) + Vec2::new(shake, 0.0);
        let color = node_color(self.kind);

        match self.kind {
            NodeKind::Tree(_) => {
                let half = self.radius;
                surface.fill_rect(
                    center + Vec2::new(-half * 0.2, 0.0),
                    Vec2::new(half * 0.4, half),
                    TRUNK,
                );
                surface.fill_circle(center - Vec2::new(0.0, half * 0.3), half, color);
            }
            NodeKind::Ore(_) => surface.fill_circle(center, self.radius, color),
        }

        if self.health < self.max_health {
            let width = self.radius * 2.0;
            let bar = center - Vec2::new(self.radius, self.radius + 10.0);
            surface.fill_rect(bar, Vec2::new(width, 4.0), HEALTH_BG);
            surface.fill_rect(
                bar,
                Vec2::new(width * (self.health / self.max_health), 4.0),
                HEALTH_FG,
            );
        }
    }
}

impl Drawable for ExperienceOrb {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera, _now: u64) {
        if self.absorbed || !camera.is_visible(self.position, self.radius) {
            return;
        }
        surface.fill_circle(
            camera.world_to_screen(self.position),
            self.radius,
            ORB.with_alpha(self.alpha),
        );
    }
}

impl Drawable for DamageNumber {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera, now: u64) {
        let pos = self.position_at(now);
        if !camera.is_visible(pos, 0.0) {
            return;
        }
        let (color, size) = if self.crit { (CRIT, 18.0) } else { (DAMAGE, 14.0) };
        surface.draw_text(
            camera.world_to_screen(pos),
            &self.label(),
            size,
            color.with_alpha(self.alpha_at(now)),
        );
    }
}

impl Drawable for SwingView {
    fn draw(&self, surface: &mut dyn RenderSurface, camera: &Camera, _now: u64) {
        if !camera.is_visible(self.origin, self.range) {
            return;
        }
        let center = camera.world_to_screen(self.origin);
        let alpha = 1.0 - self.progress.clamp(0.0, 1.0);
        match self.shape {
            HitShape::Cone | HitShape::Proximity => {
                let half = self.angle_width / 2.0;
                surface.stroke_arc(
                    center,
                    self.range,
                    self.direction - half,
                    self.direction + half,
                    3.0,
                    SWING.with_alpha(alpha),
                );
            }
            HitShape::Rect { width } => {
                let tip = center + Vec2::new(self.direction.cos(), self.direction.sin()) * self.range;
                surface.fill_rect(tip - Vec2::splat(width / 4.0), Vec2::splat(width / 2.0), SWING.with_alpha(alpha));
            }
        }
    }
}
