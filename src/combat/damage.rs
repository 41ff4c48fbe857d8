//! Damage formulas per weapon and target category.

use super::weapons::WeaponProfile;
use super::{AttackSource, TargetCategory, WeaponKind};
use crate::constants::{AXE_ORE_MULT, CRIT_DAMAGE_MULT, PICKAXE_TREE_MULT};

/// Damage before the crit roll
pub fn base_damage(profile: &WeaponProfile, category: TargetCategory, source: &AttackSource) -> f32 {
    let damage = match profile.kind {
        WeaponKind::Pickaxe => {
            let base = match &source.tool {
                Some(tool) => tool.stats.strength,
                None => profile.base_damage * (1.0 + source.strength * profile.strength_scale),
            };
            match category {
                TargetCategory::Tree => base * PICKAXE_TREE_MULT,
                _ => base,
            }
        }
        WeaponKind::Axe => {
            let base = profile.base_damage
                * (1.0 + source.levels.woodcutting as f32 * profile.level_bonus_per_level);
            match category {
                TargetCategory::Ore => base * AXE_ORE_MULT,
                _ => base,
            }
        }
        WeaponKind::Fist => match category {
            TargetCategory::Tree => 2.0 + source.strength,
            _ => source.levels.fist as f32 + (source.strength / 2.0).floor(),
        },
    };
    damage.max(0.0)
}

pub fn apply_crit(damage: f32, crit: bool) -> f32 {
    if crit {
        damage * CRIT_DAMAGE_MULT
    } else {
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::weapons::{axe, fist, pickaxe};
    use crate::combat::{SkillLevels, SourceId};
    use crate::hooks::Tool;
    use bevy::math::Vec2;

    fn source(strength: f32) -> AttackSource {
        AttackSource::new(SourceId(1), Vec2::ZERO).with_strength(strength)
    }

    #[test]
    fn test_pickaxe_scales_with_strength() {
        let p = pickaxe();
        assert!((base_damage(&p, TargetCategory::Ore, &source(0.0)) - 1.0).abs() < 1e-6);
        assert!((base_damage(&p, TargetCategory::Ore, &source(10.0)) - 2.0).abs() < 1e-6);
        assert!((base_damage(&p, TargetCategory::Tree, &source(10.0)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pickaxe_tool_replaces_formula() {
        let p = pickaxe();
        let src = source(10.0).with_tool(Tool::new("Iron Pickaxe", 5.0));
        assert_eq!(base_damage(&p, TargetCategory::Ore, &src), 5.0);
        assert_eq!(base_damage(&p, TargetCategory::Tree, &src), 1.25);
    }

    #[test]
    fn test_axe_scales_with_woodcutting() {
        let a = axe();
        let src = source(0.0).with_levels(SkillLevels {
            woodcutting: 10,
            ..Default::default()
        });
        assert!((base_damage(&a, TargetCategory::Tree, &src) - 2.0).abs() < 1e-6);
        assert!((base_damage(&a, TargetCategory::Ore, &src) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fist_formulas() {
        let f = fist();
        let src = source(4.0).with_levels(SkillLevels {
            fist: 3,
            ..Default::default()
        });
        assert_eq!(base_damage(&f, TargetCategory::Ore, &src), 5.0);
        assert_eq!(base_damage(&f, TargetCategory::Tree, &src), 6.0);

        let odd = source(5.0).with_levels(SkillLevels {
            fist: 1,
            ..Default::default()
        });
        assert_eq!(base_damage(&f, TargetCategory::Ore, &odd), 3.0);
    }

    #[test]
    fn test_crit_doubles() {
        assert_eq!(apply_crit(3.0, true), 6.0);
        assert_eq!(apply_crit(3.0, false), 3.0);
    }
}
