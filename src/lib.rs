//! # pqplot - Handshake Latency Surfaces
//!
//! Renders comparative 3D surface plots of precomputed TLS handshake
//! timings measured over a grid of (network delay, buffer size) settings,
//! for classical and post-quantum signature variants.
//!
//! ## Pipeline
//!
//! ```text
//!  grid ──────────────> mesh ─────────────┐
//!                                         v
//!  dataset ──> normalize ──> colormap ──> render ──> compose ──> PNG files
//! ```
//!
//! - The parameter mesh is built once and shared by every surface.
//! - Datasets are validated against the mesh shape when loaded.
//! - One normalization bound is resolved per figure, over exactly the
//!   variants that figure shows, and used for all its panels and its color bar.
//!
//! ### Inputs and outputs
//!
//! | Variant              | Dataset                  | Standalone figure        |
//! |----------------------|--------------------------|--------------------------|
//! | Classical            | `plain-tls.npy`          | `fig_plain.png`          |
//! | Post-quantum         | `pqc-tls.npy`            | `fig_pqc.png`            |
//! | PQ + server caching  | `pqc-with-caching.npy`   | `fig_caching.png`        |
//! | PQ + client caching  | `client-caching-tls.npy` | `fig_client_caching.png` |
//!
//! The per-variant mode also writes `fig_cb.png` (shared color bar); the
//! combined mode writes `fig_combined.png` with a transparent background.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pqplot::{CompositionMode, Config, Pipeline};
//!
//! let pipeline = Pipeline::new(Config::default().with_data_dir("out"))?;
//! let report = pipeline.run(&CompositionMode::ALL)?;
//! for artifact in &report.artifacts {
//!     println!("{}", artifact.path.display());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`grid`]: delay/buffer axes and the parameter mesh
//! - [`dataset`]: variants, `.npy` loading and shape validation
//! - [`normalize`]: shared color bound
//! - [`colormap`]: piecewise color gradient
//! - [`render`]: 3D surfaces and the color bar
//! - [`compose`]: figure layouts and PNG output
//! - [`pipeline`]: one run over the selected modes
//! - [`config`]: configuration management
//! - [`error`]: error types and result aliases

pub mod colormap;
pub mod compose;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod pipeline;
pub mod render;

// Re-exports for convenience
pub use colormap::{Anchor, ColorScale};
pub use compose::{Artifact, ArtifactKind, CompositionMode, FigureComposer, FigureLayout};
pub use config::Config;
pub use dataset::{DatasetLoader, DatasetSet, TimingDataset, Variant};
pub use error::{PlotError, Result};
pub use grid::{Axis, AxisSpec, ParameterMesh};
pub use normalize::NormalizationBound;
pub use pipeline::{InspectReport, Pipeline, RunReport};
pub use render::{Camera, ColorBar, RenderPolicy, Surface, SurfaceRenderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
