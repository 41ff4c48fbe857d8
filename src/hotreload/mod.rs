//! Hot-reload of the simulation config file.
//!
//! - `notify` watches the config file's directory
//! - a change re-reads and validates the file
//! - a valid file replaces the live config; an invalid one is rejected and
//!   the previous config stays active (rollback)

use bevy::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::plugin::HarvestWorldResource;

/// Watches `path` and applies valid edits to the running world
pub struct HotReloadPlugin {
    pub path: PathBuf,
}

impl Plugin for HotReloadPlugin {
    fn build(&self, app: &mut App) {
        let mut state = HotReloadState::default();
        match ConfigWatcher::watch(&self.path) {
            Ok(watcher) => {
                state.enabled = true;
                state.watched_file = Some(self.path.clone());
                app.insert_resource(watcher);
                info!("Hot-reload enabled for {:?}", self.path);
            }
            Err(e) => warn!("Hot-reload disabled: {}", e),
        }

        app.insert_resource(state)
            .add_event::<ConfigReloadEvent>()
            .add_systems(Update, process_config_changes);
    }
}

/// Hot-reload state tracking
#[derive(Resource, Debug, Default)]
pub struct HotReloadState {
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_reload_time: f64,
    pub last_error: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct ConfigReloadEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Resource)]
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    receiver: Mutex<Receiver<notify::Result<Event>>>,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn watch(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SimError::invalid_config(
                "path",
                format!("config file not found: {}", path.display()),
            ));
        }
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx)
            .map_err(|e| SimError::ConfigIo(std::io::Error::other(e.to_string())))?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| SimError::ConfigIo(std::io::Error::other(e.to_string())))?;

        Ok(Self {
            _watcher: watcher,
            receiver: Mutex::new(rx),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains pending filesystem events; true if any touched the config file.
    pub fn poll_changed(&self) -> bool {
        let Ok(receiver) = self.receiver.lock() else {
            return false;
        };
        let mut changed = false;
        while let Ok(result) = receiver.try_recv() {
            match result {
                Ok(event) => changed |= is_config_modify_event(&event, &self.path),
                Err(e) => warn!("File watcher error: {}", e),
            }
        }
        changed
    }
}

/// Check if event is a modification to the config file
fn is_config_modify_event(event: &Event, watched: &Path) -> bool {
    let Some(name) = watched.file_name() else {
        return false;
    };
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == Some(name))
}

/// Loads and validates `path`, recording the attempt in `state`. `None`
/// means the caller keeps its current config.
pub fn reload_config(path: &Path, state: &mut HotReloadState, now_secs: f64) -> Option<SimConfig> {
    state.last_reload_time = now_secs;
    match SimConfig::load(path) {
        Ok(config) => {
            state.reload_count += 1;
            state.last_reload_success = true;
            state.last_error = None;
            info!("Config reloaded successfully (count: {})", state.reload_count);
            Some(config)
        }
        Err(e) => {
            state.last_reload_success = false;
            state.last_error = Some(e.to_string());
            error!("Config reload failed, keeping previous config: {}", e);
            None
        }
    }
}

fn process_config_changes(
    watcher: Option<Res<ConfigWatcher>>,
    mut state: ResMut<HotReloadState>,
    mut world: ResMut<HarvestWorldResource>,
    mut events: EventWriter<ConfigReloadEvent>,
    time: Res<Time>,
) {
    let Some(watcher) = watcher else {
        return;
    };
    if !watcher.poll_changed() {
        return;
    }

    let path = watcher.path().to_path_buf();
    let reloaded = reload_config(&path, &mut state, time.elapsed_secs_f64());
    let success = reloaded.is_some();
    if let Some(config) = reloaded {
        world.0.apply_config(config);
    }
    events.send(ConfigReloadEvent {
        path,
        success,
        error: state.last_error.clone(),
    });
}

/// Serializable view of [`HotReloadState`]
#[derive(Debug, Serialize, Deserialize)]
pub struct HotReloadStatus {
    pub enabled: bool,
    pub watched_file: Option<String>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_reload_time: f64,
    pub last_error: Option<String>,
}

impl HotReloadStatus {
    pub fn from_state(state: &HotReloadState) -> Self {
        Self {
            enabled: state.enabled,
            watched_file: state.watched_file.as_ref().map(|p| p.display().to_string()),
            reload_count: state.reload_count,
            last_reload_success: state.last_reload_success,
            last_reload_time: state.last_reload_time,
            last_error: state.last_error.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_reload_valid_config() {
        let mut file = Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(world: (seed: 5))").unwrap();

        let mut state = HotReloadState::default();
        let config = reload_config(file.path(), &mut state, 1.5).unwrap();
        assert_eq!(config.world.seed, 5);
        assert_eq!(state.reload_count, 1);
        assert!(state.last_reload_success);
        assert_eq!(state.last_reload_time, 1.5);
    }

    #[test]
    fn test_reload_invalid_config_rolls_back() {
        let mut file = Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(orbs: (lifetime_ms: 0))").unwrap();

        let mut state = HotReloadState::default();
        assert!(reload_config(file.path(), &mut state, 2.0).is_none());
        assert_eq!(state.reload_count, 0);
        assert!(!state.last_reload_success);
        assert!(state.last_error.as_deref().unwrap().contains("lifetime_ms"));
    }

    #[test]
    fn test_reload_unparseable_config() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{invalid json").unwrap();

        let mut state = HotReloadState::default();
        assert!(reload_config(file.path(), &mut state, 0.0).is_none());
        assert!(state.last_error.is_some());
    }

    #[test]
    fn test_is_config_modify_event() {
        let watched = PathBuf::from("config/harvest.ron");
        let event = Event {
            kind: notify::EventKind::Modify(notify::event::ModifyKind::Data(
                notify::event::DataChange::Any,
            )),
            paths: vec![PathBuf::from("/abs/config/harvest.ron")],
            attrs: Default::default(),
        };
        assert!(is_config_modify_event(&event, &watched));

        let other = Event {
            paths: vec![PathBuf::from("config/other.ron")],
            ..event
        };
        assert!(!is_config_modify_event(&other, &watched));
    }

    #[test]
    fn test_watch_missing_file() {
        assert!(ConfigWatcher::watch(Path::new("/no/such/harvest.ron")).is_err());
    }

    #[test]
    fn test_status_json() {
        let state = HotReloadState {
            enabled: true,
            watched_file: Some(PathBuf::from("config/harvest.ron")),
            reload_count: 3,
            last_reload_success: true,
            ..Default::default()
        };
        let json = HotReloadStatus::from_state(&state).to_json();
        assert!(json.contains("\"reload_count\":3"));
        assert!(json.contains("harvest.ron"));
    }
}
