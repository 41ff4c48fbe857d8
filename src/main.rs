//! Headless demo: a player walks a loop, mining and chopping whatever is in
//! front of them, and the skill table is printed at the end.
//!
//! Usage: `harvest-sim [config.ron|config.json] [seconds]`

use anyhow::Context;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use harvest_core::hotreload::HotReloadPlugin;
use harvest_core::logging::LoggingPlugin;
use harvest_core::plugin::{AttackRequest, HarvestPlugin, HarvestWorldResource, NodeDestroyed, SkillLevelUp};
use harvest_core::SimConfig;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let seconds: u64 = match args.next() {
        Some(s) => s.parse().context("seconds must be a whole number")?,
        None => 60,
    };

    let config = match &config_path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LoggingPlugin::default())
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .add_plugins(HarvestPlugin { config })
        .add_systems(Update, (drive_player, report_events));
    if let Some(path) = config_path {
        app.add_plugins(HotReloadPlugin { path });
    }

    let frames = seconds * 1000 / FRAME.as_millis() as u64;
    for _ in 0..frames {
        app.update();
    }

    let world = &app.world().resource::<HarvestWorldResource>().0;
    info!("simulated {} ms", world.now_ms());
    for row in world.skills.snapshot() {
        info!("{:<12} level {:>3}  total xp {:>8.0}", row.name, row.level, row.total_experience);
    }
    info!(
        "orbs granted {} xp, {} still on the ground",
        world.orbs.total_granted(),
        world.orbs.pending_value()
    );
    Ok(())
}

/// Circles the origin and swings at the nearest node
fn drive_player(mut world: ResMut<HarvestWorldResource>, mut attacks: EventWriter<AttackRequest>) {
    let world = &mut world.0;
    let t = world.now_ms() as f32 / 1000.0;
    let position = Vec2::new((t * 0.2).cos(), (t * 0.2).sin()) * 300.0;
    world.set_player_position(position);

    let Some(target) = world.nodes.nodes_in_radius(position, 120.0).first().copied() else {
        return;
    };
    let delta = target.position - position;
    let weapon = if target.kind.is_tree() { "axe" } else { "pickaxe" };
    attacks.send(AttackRequest {
        weapon: weapon.to_string(),
        direction: delta.y.atan2(delta.x),
        source: None,
    });
}

fn report_events(mut destroyed: EventReader<NodeDestroyed>, mut level_ups: EventReader<SkillLevelUp>) {
    for event in destroyed.read() {
        info!("node {} destroyed with {}", event.node, event.weapon);
    }
    for event in level_ups.read() {
        info!("{} reached level {}", event.skill, event.level);
    }
}
