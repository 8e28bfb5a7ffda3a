use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chisel_area::WorldSettings;
use chisel_blob::{BlobVersion, DEFAULT_SIDE, SideSampling};
use chisel_blocks::{AIR, StateId, StateRegistry};
use chisel_edit::DEFAULT_MAX_DEPTH;
use serde::Deserialize;

// Top-level chisel.toml
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ChiselConfig {
    #[serde(default)]
    pub states: Option<PathBuf>,
    #[serde(default)]
    pub blob: BlobSection,
    #[serde(default)]
    pub stats: StatsSection,
    #[serde(default)]
    pub undo: UndoSection,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BlobSection {
    pub side: usize,
    pub default_version: String,
    pub fallback_state: StateId,
}

impl Default for BlobSection {
    fn default() -> Self {
        Self {
            side: DEFAULT_SIDE,
            default_version: "paletted".to_string(),
            fallback_state: AIR,
        }
    }
}

/// Side-flag window; unset fields scale with the blob side.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct StatsSection {
    pub depth: Option<usize>,
    pub window_min: Option<usize>,
    pub window_max: Option<usize>,
    pub threshold: Option<usize>,
}

impl StatsSection {
    pub fn sampling_for(&self, side: usize) -> SideSampling {
        let d = SideSampling::for_side(side);
        SideSampling {
            depth: self.depth.unwrap_or(d.depth),
            window_min: self.window_min.unwrap_or(d.window_min),
            window_max: self.window_max.unwrap_or(d.window_max),
            threshold: self.threshold.unwrap_or(d.threshold),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UndoSection {
    pub max_depth: usize,
}

impl Default for UndoSection {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ChiselConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn version(&self) -> Result<BlobVersion, Box<dyn Error>> {
        BlobVersion::from_name(&self.blob.default_version)
            .ok_or_else(|| format!("unknown blob version `{}`", self.blob.default_version).into())
    }

    pub fn world_settings(&self) -> Result<WorldSettings, Box<dyn Error>> {
        self.settings_for_side(self.blob.side)
    }

    /// Settings for a world whose blobs are `side` wide, which may differ
    /// from the configured side when a stored document says otherwise.
    pub fn settings_for_side(&self, side: usize) -> Result<WorldSettings, Box<dyn Error>> {
        Ok(WorldSettings {
            side,
            version: self.version()?,
            fallback_state: self.blob.fallback_state,
            sampling: Some(self.stats.sampling_for(side)),
        })
    }

    /// State table from the configured file, or one holding only air.
    pub fn registry(&self) -> Result<Arc<StateRegistry>, Box<dyn Error>> {
        let reg = match &self.states {
            Some(path) => StateRegistry::load_from_path(path)
                .map_err(|e| format!("loading states from {}: {e}", path.display()))?,
            None => StateRegistry::new(),
        };
        log::info!("state table has {} entries", reg.len());
        Ok(Arc::new(reg))
    }
}
