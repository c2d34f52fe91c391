//! Saved control-bar configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::ControlBarState;

/// Group assigned to presets saved without one
pub const DEFAULT_PRESET_GROUP: &str = "Personal";

/// A named, grouped snapshot of control-bar state.
///
/// At most one preset in a collection is the default; it seeds the draft
/// state on startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub is_default: bool,
    pub state: ControlBarState,
    pub created_at: DateTime<Utc>,
}

fn default_group() -> String {
    DEFAULT_PRESET_GROUP.to_string()
}
