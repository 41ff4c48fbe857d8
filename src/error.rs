//! Error taxonomy for the simulation core.
//!
//! Gameplay entry points never surface these to callers: they log and
//! degrade to `false` / `None` so one bad request cannot stall the tick.
//! Config loading and node housekeeping return them directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown weapon type: {0}")]
    UnknownWeapon(String),

    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    #[error("{skill} level {required} required (current {current})")]
    RequirementNotMet {
        skill: String,
        required: u32,
        current: u32,
    },

    #[error("invalid config: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("config io error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("node {id} is corrupt: {reason}")]
    CorruptNode { id: u64, reason: String },
}

impl SimError {
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
