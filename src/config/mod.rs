//! Configuration management.
//!
//! Every field has a default that reproduces the fixed benchmark layout, so
//! a run with no configuration file renders the standard figure set.
//! Sources, lowest precedence first:
//! - built-in defaults
//! - TOML config file (explicit path, or `<config dir>/pqplot/config.toml`)
//! - Environment variables (`PQPLOT_DATA_DIR`, `PQPLOT_OUT_DIR`)
//! - CLI arguments

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compose::FigureLayout;
use crate::dataset::Variant;
use crate::error::{PlotError, Result};
use crate::grid::{AxisSpec, ParameterMesh, BUFFER_AXIS, DELAY_AXIS};
use crate::render::RenderPolicy;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input and output locations
    #[serde(default)]
    pub data: DataConfig,

    /// Parameter axes
    #[serde(default)]
    pub grid: GridConfig,

    /// Presentation shared by every panel
    #[serde(default)]
    pub render: RenderPolicy,

    /// Pixel sizes of the figures
    #[serde(default)]
    pub layout: FigureLayout,

    /// Standalone per-variant figures
    #[serde(default)]
    pub per_variant: PerVariantConfig,

    /// Combined multi-panel figure
    #[serde(default)]
    pub combined: CombinedConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PlotError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Default config file location (`<config dir>/pqplot/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pqplot").join("config.toml"))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::from_env()),
            },
        };
        tracing::debug!("Using config file {}", path.display());
        Ok(Self::from_file(path)?.with_env_overrides())
    }

    /// Apply `PQPLOT_DATA_DIR` and `PQPLOT_OUT_DIR`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("PQPLOT_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("PQPLOT_OUT_DIR") {
            self.data.out_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Set the dataset directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.dir = dir.into();
        self
    }

    /// Set the image output directory
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.out_dir = Some(dir.into());
        self
    }

    /// Preview the combined figure with `command` after saving
    pub fn with_preview(mut self, command: impl Into<String>) -> Self {
        self.combined.preview_command = Some(command.into());
        self
    }

    /// Directory images are written to (defaults to the dataset directory)
    pub fn out_dir(&self) -> &Path {
        self.data.out_dir.as_deref().unwrap_or(&self.data.dir)
    }

    /// Build the parameter mesh described by `grid`
    pub fn mesh(&self) -> Result<ParameterMesh> {
        ParameterMesh::from_specs(self.grid.delay, self.grid.buffer)
    }

    /// Check everything that would otherwise fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        self.mesh()?;

        let RenderPolicy {
            z_min,
            z_max,
            camera,
        } = self.render;
        if !(z_min.is_finite() && z_max.is_finite()) || z_max <= z_min {
            return Err(PlotError::Config(format!(
                "invalid height range {z_min}..{z_max}"
            )));
        }
        if !(camera.azimuth_deg.is_finite() && camera.elevation_deg.is_finite()) {
            return Err(PlotError::Config("camera angles must be finite".to_string()));
        }

        self.layout.validate()?;

        check_variants("per_variant.variants", &self.per_variant.variants)?;
        check_variants("combined.variants", &self.combined.variants)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// A figure needs at least one panel, and each variant appears once.
fn check_variants(field: &str, variants: &[Variant]) -> Result<()> {
    if variants.is_empty() {
        return Err(PlotError::Config(format!("{field} must not be empty")));
    }
    for (i, variant) in variants.iter().enumerate() {
        if variants[..i].contains(variant) {
            return Err(PlotError::Config(format!(
                "{field} lists {variant} more than once"
            )));
        }
    }
    Ok(())
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `<variant>.npy`
    pub dir: PathBuf,

    /// Where images are written; the dataset directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            out_dir: None,
        }
    }
}

/// Parameter axes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Delay axis in milliseconds
    pub delay: AxisSpec,

    /// Buffer-size axis in bytes
    pub buffer: AxisSpec,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            delay: DELAY_AXIS,
            buffer: BUFFER_AXIS,
        }
    }
}

/// Standalone per-variant figures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerVariantConfig {
    /// Variants to draw, in order; the color bar follows the last one.
    /// The shared bound covers exactly these variants.
    pub variants: Vec<Variant>,
}

impl Default for PerVariantConfig {
    fn default() -> Self {
        Self {
            variants: Variant::ALL.to_vec(),
        }
    }
}

/// Combined multi-panel figure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinedConfig {
    /// Panels, left to right. The shared bound covers exactly these
    /// variants, so leaving client caching out also keeps its slow cells
    /// from flattening the other panels' colors.
    pub variants: Vec<Variant>,

    /// Save with a transparent background
    pub transparent: bool,

    /// Viewer launched on the saved image, e.g. `xdg-open`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_command: Option<String>,
}

impl Default for CombinedConfig {
    fn default() -> Self {
        Self {
            variants: vec![Variant::PlainTls, Variant::PqcTls, Variant::PqcWithCaching],
            transparent: true,
            preview_command: None,
        }
    }
}
