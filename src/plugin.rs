//! Bevy integration: the world as a resource, driven once per frame.

use bevy::prelude::*;
use tracing::debug;

use crate::combat::{AttackSource, SourceId, WeaponKind};
use crate::config::SimConfig;
use crate::nodes::NodeId;
use crate::world::{HarvestWorld, WorldOutcome};

pub struct HarvestPlugin {
    pub config: SimConfig,
}

impl Default for HarvestPlugin {
    fn default() -> Self {
        Self {
            config: SimConfig::default(),
        }
    }
}

impl Plugin for HarvestPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HarvestWorldResource(HarvestWorld::new(self.config.clone())))
            .add_event::<AttackRequest>()
            .add_event::<NodeDestroyed>()
            .add_event::<SkillLevelUp>()
            .init_resource::<LastOutcome>()
            .add_systems(
                Update,
                (
                    process_attack_requests,
                    tick_harvest_world,
                    publish_world_events,
                )
                    .chain(),
            );
    }
}

#[derive(Resource, Debug)]
pub struct HarvestWorldResource(pub HarvestWorld);

/// Swing request from input or the network. `source: None` is the local player.
#[derive(Event, Debug, Clone)]
pub struct AttackRequest {
    pub weapon: String,
    pub direction: f32,
    pub source: Option<AttackSource>,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct NodeDestroyed {
    pub node: NodeId,
    pub by: SourceId,
    pub weapon: WeaponKind,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct SkillLevelUp {
    pub skill: String,
    pub level: u32,
}

/// Outcome of the last tick, handed from the tick system to the publisher
#[derive(Resource, Debug, Default)]
struct LastOutcome(WorldOutcome);

fn process_attack_requests(
    mut requests: EventReader<AttackRequest>,
    mut world: ResMut<HarvestWorldResource>,
) {
    for request in requests.read() {
        let started = match &request.source {
            Some(source) => {
                world
                    .0
                    .start_attack_from(&request.weapon, request.direction, source.clone())
            }
            None => world.0.start_attack(&request.weapon, request.direction),
        };
        if !started {
            debug!(weapon = %request.weapon, "attack request not started");
        }
    }
}

fn tick_harvest_world(
    time: Res<Time>,
    mut world: ResMut<HarvestWorldResource>,
    mut last: ResMut<LastOutcome>,
) {
    last.0 = world.0.tick(time.delta_secs());
}

fn publish_world_events(
    mut last: ResMut<LastOutcome>,
    mut destroyed: EventWriter<NodeDestroyed>,
    mut level_ups: EventWriter<SkillLevelUp>,
) {
    let outcome = std::mem::take(&mut last.0);
    for hit in outcome.destroyed() {
        destroyed.send(NodeDestroyed {
            node: hit.target,
            by: hit.source,
            weapon: hit.weapon,
        });
    }
    for level_up in outcome.level_ups {
        level_ups.send(SkillLevelUp {
            skill: level_up.skill,
            level: level_up.level,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{NodeKind, OreType};
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn test_app() -> App {
        let mut config = SimConfig::default();
        config.nodes.trees.min_count = 0;
        config.nodes.ores.min_count = 0;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
            .add_plugins(HarvestPlugin { config });
        app
    }

    #[test]
    fn test_plugin_ticks_world() {
        let mut app = test_app();
        for _ in 0..5 {
            app.update();
        }
        let now = app.world().resource::<HarvestWorldResource>().0.now_ms();
        assert!(now > 0);
    }

    #[test]
    fn test_attack_requests_destroy_node() {
        let mut app = test_app();
        let rock = app
            .world_mut()
            .resource_mut::<HarvestWorldResource>()
            .0
            .nodes
            .spawn_node_at_level(NodeKind::Ore(OreType::Copper), Vec2::new(40.0, 0.0), 1);

        let mut seen = Vec::new();
        for _ in 0..400 {
            app.world_mut().send_event(AttackRequest {
                weapon: "pickaxe".into(),
                direction: 0.0,
                source: None,
            });
            app.update();
            let events = app.world().resource::<Events<NodeDestroyed>>();
            seen.extend(events.get_cursor().read(events).cloned());
            if !seen.is_empty() {
                break;
            }
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].node, rock);
        assert_eq!(seen[0].weapon, WeaponKind::Pickaxe);
    }
}
