//! Configuration management for the focus core
//!
//! This module handles loading, parsing, and validating focus policy
//! configuration from TOML files: click-to-focus vs focus-follows-mouse,
//! new-window focus policy, focus-stealing prevention, alt-tab cycling and
//! click grab behavior.

use crate::backend::ButtonSelection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration struct containing all focus settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AxiomFocusConfig {
    /// Focus policy
    #[serde(default)]
    pub focus: FocusConfig,

    /// Alt-tab cycling
    #[serde(default)]
    pub cycle: CycleConfig,

    /// Click-to-focus button grabs
    #[serde(default)]
    pub grab: GrabConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Focus policy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusConfig {
    /// Click to focus (false = focus follows mouse)
    pub click_to_focus: bool,

    /// Give focus to newly mapped windows
    pub focus_new: bool,

    /// Refuse focus to new windows whose last user interaction predates
    /// the focused window's
    pub prevent_focus_stealing: bool,

    /// Raise (and focus) on click even in focus-follows-mouse mode
    pub raise_on_click: bool,

    /// Urgent windows may take focus even when `focus_new` is off
    pub urgent_steals_focus: bool,
}

/// Alt-tab cycling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycleConfig {
    /// Include iconified windows when cycling
    pub cycle_hidden: bool,

    /// Include windows from every workspace when cycling
    pub cycle_workspaces: bool,
}

/// Click grab configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrabConfig {
    /// Grab any button instead of the primary button only
    pub any_button: bool,

    /// Replay the grabbed click to the client after focusing it
    pub replay_click: bool,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable debug logging
    pub debug: bool,

    /// Default log filter ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            click_to_focus: true,
            focus_new: true,
            prevent_focus_stealing: false,
            raise_on_click: true,
            urgent_steals_focus: true,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_hidden: true,
            cycle_workspaces: false,
        }
    }
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            any_button: true,
            replay_click: true,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

impl FocusConfig {
    /// Clients need a click grab whenever a click can move focus or raise.
    pub fn wants_click_grabs(&self) -> bool {
        self.click_to_focus || self.raise_on_click
    }
}

impl GrabConfig {
    pub fn buttons(&self) -> ButtonSelection {
        if self.any_button {
            ButtonSelection::Any
        } else {
            ButtonSelection::Primary
        }
    }
}

impl AxiomFocusConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let relative = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(relative)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: AxiomFocusConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            anyhow::bail!("Invalid log_level: {}", self.general.log_level);
        }

        // A replayed click needs a synchronous grab to replay from
        if self.grab.replay_click && !self.focus.wants_click_grabs() {
            anyhow::bail!("replay_click requires click_to_focus or raise_on_click");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Sections of the partial config that differ from the defaults override this config
    pub fn merge_partial(mut self, partial: AxiomFocusConfig) -> Self {
        let default_config = AxiomFocusConfig::default();

        if partial.focus != default_config.focus {
            self.focus = partial.focus;
        }
        if partial.cycle != default_config.cycle {
            self.cycle = partial.cycle;
        }
        if partial.grab != default_config.grab {
            self.grab = partial.grab;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }

        self
    }

    /// Effective log filter for the binary
    pub fn log_filter(&self) -> &str {
        if self.general.debug {
            "debug"
        } else {
            &self.general.log_level
        }
    }
}
