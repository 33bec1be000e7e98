//! End-to-end rendering run.
//!
//! ```text
//!  Config ──> ParameterMesh ─────────────────────────────┐
//!    │                                                   v
//!    ├──> DatasetLoader ──> DatasetSet ──> bound/mode ──> FigureComposer ──> PNG
//!    │                                                   ^
//!    └──> ColorScale ────────────────────────────────────┘
//! ```
//!
//! Mesh, scale and loader are built once in [`Pipeline::new`]. A run loads
//! every dataset it needs before drawing anything, then resolves one bound
//! per mode over exactly the variants that mode displays.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::colormap::ColorScale;
use crate::compose::{Artifact, CompositionMode, FigureComposer};
use crate::config::Config;
use crate::dataset::{DatasetLoader, DatasetSet, Variant};
use crate::error::Result;
use crate::grid::ParameterMesh;
use crate::normalize::NormalizationBound;

/// Bound resolved for one mode.
#[derive(Debug, Clone, Serialize)]
pub struct ModeSummary {
    /// Mode rendered
    pub mode: CompositionMode,
    /// Variants shown, which are also the variants the bound covers
    pub variants: Vec<Variant>,
    /// Shared color bound
    pub bound: NormalizationBound,
}

/// Outcome of [`Pipeline::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// One entry per mode, in run order
    pub modes: Vec<ModeSummary>,
    /// Every image written
    pub artifacts: Vec<Artifact>,
}

/// Per-variant statistics reported by [`Pipeline::inspect`].
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    /// Variant
    pub variant: Variant,
    /// `(buffer samples, delay samples)`
    pub shape: (usize, usize),
    /// Fastest handshake, ms
    pub min: Option<f64>,
    /// Slowest handshake, ms
    pub max: Option<f64>,
}

/// Outcome of [`Pipeline::inspect`].
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// Loaded datasets in variant order
    pub datasets: Vec<DatasetSummary>,
    /// Bound each mode would use
    pub modes: Vec<ModeSummary>,
}

/// The rendering pipeline for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    mesh: ParameterMesh,
    scale: ColorScale,
    loader: DatasetLoader,
}

impl Pipeline {
    /// Validate `config` and build the shared mesh, scale and loader.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let mesh = config.mesh()?;
        let loader = DatasetLoader::new(&config.data.dir);

        Ok(Self {
            config,
            mesh,
            scale: ColorScale::default(),
            loader,
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared parameter mesh.
    pub fn mesh(&self) -> &ParameterMesh {
        &self.mesh
    }

    /// Shared color scale.
    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Variants displayed in `mode`.
    pub fn variants_for(&self, mode: CompositionMode) -> &[Variant] {
        match mode {
            CompositionMode::PerVariant => &self.config.per_variant.variants,
            CompositionMode::Combined => &self.config.combined.variants,
        }
    }

    /// Load every dataset the given modes display, failing before any rendering.
    pub fn load(&self, modes: &[CompositionMode]) -> Result<DatasetSet> {
        let needed: BTreeSet<Variant> = modes
            .iter()
            .flat_map(|&mode| self.variants_for(mode).iter().copied())
            .collect();

        tracing::info!(
            "Loading {} dataset(s) from {}",
            needed.len(),
            self.loader.dir().display()
        );
        self.loader.load_all(needed, &self.mesh)
    }

    /// Render the given modes and write their images.
    pub fn run(&self, modes: &[CompositionMode]) -> Result<RunReport> {
        let datasets = self.load(modes)?;
        self.run_with(&datasets, modes)
    }

    /// Render already-loaded datasets.
    pub fn run_with(&self, datasets: &DatasetSet, modes: &[CompositionMode]) -> Result<RunReport> {
        let composer = FigureComposer::new(self.config.out_dir())
            .with_layout(self.config.layout)
            .with_policy(self.config.render)
            .with_transparent_combined(self.config.combined.transparent)
            .with_preview(self.config.combined.preview_command.clone());

        let mut report = RunReport::default();
        for &mode in modes {
            let summary = self.summarize(datasets, mode);
            tracing::info!(
                "Rendering {} figure(s) for {} variant(s), bound {}",
                mode,
                summary.variants.len(),
                summary.bound
            );

            let artifacts = composer.compose(
                mode,
                &summary.variants,
                &self.mesh,
                datasets,
                &self.scale,
                summary.bound,
            )?;

            report.artifacts.extend(artifacts);
            report.modes.push(summary);
        }
        Ok(report)
    }

    /// Load every configured dataset and report statistics and bounds.
    pub fn inspect(&self) -> Result<InspectReport> {
        let datasets = self.load(&CompositionMode::ALL)?;

        Ok(InspectReport {
            datasets: datasets
                .iter()
                .map(|d| DatasetSummary {
                    variant: d.variant(),
                    shape: d.shape(),
                    min: d.min_value(),
                    max: d.max_value(),
                })
                .collect(),
            modes: CompositionMode::ALL
                .iter()
                .map(|&mode| self.summarize(&datasets, mode))
                .collect(),
        })
    }

    fn summarize(&self, datasets: &DatasetSet, mode: CompositionMode) -> ModeSummary {
        let variants = self.variants_for(mode).to_vec();
        let bound = NormalizationBound::resolve_for(datasets, &variants);
        ModeSummary {
            mode,
            variants,
            bound,
        }
    }
}
