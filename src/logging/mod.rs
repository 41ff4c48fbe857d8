//! Structured logging setup.
//!
//! `tracing` macros are used throughout the crate; this module installs a
//! `tracing_subscriber` once per process with per-module filters. `RUST_LOG`
//! overrides the configured filter.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Installs the default subscriber when added to an app
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self {
            config: TracingConfig::default(),
        }
    }
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_thread_ids: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("harvest_core::combat".to_string(), LogLevel::Info),
                ("harvest_core::nodes".to_string(), LogLevel::Info),
                ("harvest_core::orbs".to_string(), LogLevel::Warn),
                ("harvest_core::skills".to_string(), LogLevel::Info),
            ],
            show_targets: true,
            show_thread_ids: false,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// Verbose preset for debugging hit resolution
    pub fn verbose() -> Self {
        Self {
            default_level: LogLevel::Debug,
            module_filters: vec![("harvest_core::combat".to_string(), LogLevel::Trace)],
            ..Default::default()
        }
    }

    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Idempotent; the first call's config wins.
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let (targets, thread_ids, file_line) =
        (config.show_targets, config.show_thread_ids, config.show_file_line);
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(targets)
            .with_thread_ids(thread_ids)
            .with_file(file_line)
            .with_line_number(file_line)
            .compact();

        // Another global subscriber may already be installed
        let _ = subscriber.try_init();
    });
}

pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Enters a span for its lifetime and logs the elapsed time on drop
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!("timed", name);
        Self {
            name,
            started: Instant::now(),
            _span: span.entered(),
        }
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        tracing::trace!(
            name = self.name,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "span finished"
        );
    }
}
