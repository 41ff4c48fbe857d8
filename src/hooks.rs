//! External collaborators the simulation calls out to.
//!
//! Sound playback, the equipped-tool lookup, the skill UI and the chat log
//! all live outside the core. Each is a trait with a no-op default so a
//! headless world runs without any of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("sound not loaded: {0}")]
    NotLoaded(String),
    #[error("playback failed: {0}")]
    Playback(String),
}

pub trait AudioSink: Send + Sync {
    fn play_sound(&self, name: &str, volume: f32) -> Result<(), AudioError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    pub strength: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub stats: ToolStats,
}

impl Tool {
    pub fn new(name: &str, strength: f32) -> Self {
        Self {
            name: name.to_string(),
            stats: ToolStats { strength },
        }
    }
}

pub trait ToolProvider: Send + Sync {
    fn selected_tool(&self) -> Option<Tool>;
}

pub trait SkillUiNotifier: Send + Sync {
    fn notify_level_up(&self, skill: &str, level: u32);
}

pub trait SystemMessageSink: Send + Sync {
    fn post_system_message(&self, text: &str);
}

/// Does nothing; stands in for every hook by default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl AudioSink for NoopHooks {
    fn play_sound(&self, _name: &str, _volume: f32) -> Result<(), AudioError> {
        Ok(())
    }
}

impl ToolProvider for NoopHooks {
    fn selected_tool(&self) -> Option<Tool> {
        None
    }
}

impl SkillUiNotifier for NoopHooks {
    fn notify_level_up(&self, _skill: &str, _level: u32) {}
}

impl SystemMessageSink for NoopHooks {
    fn post_system_message(&self, _text: &str) {}
}

pub struct Hooks {
    pub audio: Box<dyn AudioSink>,
    pub tools: Box<dyn ToolProvider>,
    pub skill_ui: Box<dyn SkillUiNotifier>,
    pub messages: Box<dyn SystemMessageSink>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            audio: Box::new(NoopHooks),
            tools: Box::new(NoopHooks),
            skill_ui: Box::new(NoopHooks),
            messages: Box::new(NoopHooks),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

impl Hooks {
    /// Playback failures are logged and swallowed.
    pub fn play_sound(&self, name: &str, volume: f32) {
        if let Err(err) = self.audio.play_sound(name, volume) {
            warn!(sound = name, %err, "sound playback failed");
        }
    }

    pub fn selected_tool(&self) -> Option<Tool> {
        self.tools.selected_tool()
    }

    pub fn notify_level_up(&self, skill: &str, level: u32) {
        debug!(skill, level, "notifying skill ui");
        self.skill_ui.notify_level_up(skill, level);
    }

    pub fn post_system_message(&self, text: &str) {
        self.messages.post_system_message(text);
    }
}
