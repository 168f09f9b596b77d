//! Host application callbacks
//!
//! The pipeline never drives the UI directly; matched commands are handed to
//! an [`ActionHandler`] supplied by the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Application mode shown by the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    /// No mode panel active
    #[default]
    Home,
    /// Camera / object description
    Camera,
    /// Turn-by-turn guidance
    Navigation,
    /// Emergency assistance
    Emergency,
    /// Settings panel
    Settings,
}

impl AppMode {
    /// Lowercase mode name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Camera => "camera",
            Self::Navigation => "navigation",
            Self::Emergency => "emergency",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "camera" => Ok(Self::Camera),
            "navigation" => Ok(Self::Navigation),
            "emergency" => Ok(Self::Emergency),
            "settings" => Ok(Self::Settings),
            other => Err(crate::Error::Config(format!("unknown mode: {other}"))),
        }
    }
}

/// Callbacks exposed by the host application
///
/// Each method receives the command text that followed the wake phrase so
/// the host can refine the action ("navigation to the pharmacy").
pub trait ActionHandler: Send {
    /// Camera command
    ///
    /// # Errors
    ///
    /// Returns error if the host could not perform the action
    fn on_camera_action(&mut self, action: &str) -> Result<()>;

    /// Navigation command
    ///
    /// # Errors
    ///
    /// Returns error if the host could not perform the action
    fn on_navigation_action(&mut self, action: &str) -> Result<()>;

    /// Emergency command
    ///
    /// # Errors
    ///
    /// Returns error if the host could not perform the action
    fn on_emergency_action(&mut self, action: &str) -> Result<()>;

    /// A setting was changed by voice
    ///
    /// # Errors
    ///
    /// Returns error if the setting could not be applied
    fn on_settings_change(&mut self, setting: &str, value: &str) -> Result<()>;

    /// The active mode panel should change
    ///
    /// # Errors
    ///
    /// Returns error if the host could not switch modes
    fn on_mode_change(&mut self, mode: AppMode) -> Result<()>;
}

/// Handler that only logs; used by the CLI
#[derive(Debug, Default)]
pub struct TracingActions;

impl ActionHandler for TracingActions {
    fn on_camera_action(&mut self, action: &str) -> Result<()> {
        tracing::info!(action, "camera action");
        Ok(())
    }

    fn on_navigation_action(&mut self, action: &str) -> Result<()> {
        tracing::info!(action, "navigation action");
        Ok(())
    }

    fn on_emergency_action(&mut self, action: &str) -> Result<()> {
        tracing::warn!(action, "emergency action");
        Ok(())
    }

    fn on_settings_change(&mut self, setting: &str, value: &str) -> Result<()> {
        tracing::info!(setting, value, "settings change");
        Ok(())
    }

    fn on_mode_change(&mut self, mode: AppMode) -> Result<()> {
        tracing::info!(%mode, "mode change");
        Ok(())
    }
}
