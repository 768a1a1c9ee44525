//! Command state snapshots reported by the editing surface.
//!
//! A `CommandState` is a point-in-time read of which named commands are active
//! or available at the surface's current selection, together with the HTML the
//! surface held when the query ran. The controller replaces it wholesale after
//! every command execution and every explicit query; there is deliberately no
//! mutating API once a snapshot has been built.
//!
//! Wire format (bridges that speak JSON):
//!
//! ```json
//! { "html": "<p>hi</p>",
//!   "commands": { "bold": { "active": true, "enabled": true, "value": null } } }
//! ```
//!
//! Every field is optional on the wire. `enabled` defaults to `true` so a
//! surface that only reports activation still yields usable availability.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status of one named command at the moment of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default = "CommandStatus::default_enabled")]
    pub enabled: bool,
    /// Command-specific value (font name, block format, color...).
    #[serde(default)]
    pub value: Option<String>,
}

impl Default for CommandStatus {
    fn default() -> Self {
        Self {
            active: false,
            enabled: Self::default_enabled(),
            value: None,
        }
    }
}

impl CommandStatus {
    const fn default_enabled() -> bool {
        true
    }

    pub fn active() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            active: false,
            enabled: false,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Immutable snapshot of surface command state plus the content captured with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandState {
    #[serde(default)]
    html: String,
    #[serde(default)]
    commands: BTreeMap<String, CommandStatus>,
}

impl CommandState {
    pub fn new<I, K>(html: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = (K, CommandStatus)>,
        K: Into<String>,
    {
        Self {
            html: html.into(),
            commands: commands
                .into_iter()
                .map(|(name, status)| (name.into(), status))
                .collect(),
        }
    }

    /// Decode a bridge response.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("decode command state")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("encode command state")
    }

    /// Content snapshot captured when the state was queried.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn status(&self, name: &str) -> Option<&CommandStatus> {
        self.commands.get(name)
    }

    /// Unknown commands are reported inactive.
    pub fn is_active(&self, name: &str) -> bool {
        self.commands.get(name).is_some_and(|s| s.active)
    }

    /// Unknown commands are reported enabled; the surface decides at execution time.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.commands.get(name).is_none_or(|s| s.enabled)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.commands.get(name).and_then(|s| s.value.as_deref())
    }

    pub fn commands(&self) -> impl Iterator<Item = (&str, &CommandStatus)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn active_commands(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(|(_, s)| s.active)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
