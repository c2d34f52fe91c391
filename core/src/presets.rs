//! Preset storage: named control-bar states persisted as a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dashboard_types::{ControlBarState, DEFAULT_PRESET_GROUP, Preset};

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("preset name must not be empty")]
    EmptyName,
    #[error("no preset with id or name '{0}'")]
    NotFound(String),
    #[error("IO error writing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize presets: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Presets backed by a single JSON file, rewritten on every change.
#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    presets: Vec<Preset>,
}

impl PresetStore {
    /// Open the store at `path`.
    ///
    /// A missing, unreadable or corrupt file yields an empty store; the file is
    /// only written on the next change.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let presets = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("[PRESETS] Ignoring corrupt preset file {:?}: {}", path, e);
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!("[PRESETS] Failed to read {:?}: {}", path, e);
                Vec::new()
            }
        };
        Self { path, presets }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// The preset marked as default, if any
    pub fn default_preset(&self) -> Option<&Preset> {
        self.presets.iter().find(|p| p.is_default)
    }

    /// Look up by id first, then by exact name
    pub fn find(&self, id_or_name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.id == id_or_name)
            .or_else(|| self.presets.iter().find(|p| p.name == id_or_name))
    }

    /// Presets keyed by group name, each group in save order
    pub fn grouped(&self) -> BTreeMap<&str, Vec<&Preset>> {
        let mut groups: BTreeMap<&str, Vec<&Preset>> = BTreeMap::new();
        for preset in &self.presets {
            groups.entry(preset.group.as_str()).or_default().push(preset);
        }
        groups
    }

    /// Save `state` under a new preset. Blank groups fall back to `Personal`.
    pub fn save(
        &mut self,
        name: &str,
        group: &str,
        state: ControlBarState,
    ) -> Result<&Preset, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let group = match group.trim() {
            "" => DEFAULT_PRESET_GROUP,
            g => g,
        };
        self.presets.push(Preset {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            group: group.to_string(),
            is_default: false,
            state,
            created_at: Utc::now(),
        });
        self.persist()?;
        tracing::info!("[PRESETS] Saved preset '{}' in group '{}'", name, group);
        Ok(&self.presets[self.presets.len() - 1])
    }

    /// Remove a preset by id or name
    pub fn delete(&mut self, id_or_name: &str) -> Result<Preset, PresetError> {
        let id = self
            .find(id_or_name)
            .map(|p| p.id.clone())
            .ok_or_else(|| PresetError::NotFound(id_or_name.to_string()))?;
        let index = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PresetError::NotFound(id_or_name.to_string()))?;
        let removed = self.presets.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Toggle the default flag on one preset and clear it on all others.
    ///
    /// Returns whether the preset is now the default.
    pub fn set_default(&mut self, id_or_name: &str) -> Result<bool, PresetError> {
        let id = self
            .find(id_or_name)
            .map(|p| p.id.clone())
            .ok_or_else(|| PresetError::NotFound(id_or_name.to_string()))?;
        let mut now_default = false;
        for preset in &mut self.presets {
            if preset.id == id {
                preset.is_default = !preset.is_default;
                now_default = preset.is_default;
            } else {
                preset.is_default = false;
            }
        }
        self.persist()?;
        Ok(now_default)
    }

    fn persist(&self) -> Result<(), PresetError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PresetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(&self.presets)?;
        fs::write(&self.path, contents).map_err(|source| PresetError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
