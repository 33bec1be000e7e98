//! Error types for the rendering pipeline.
//!
//! Every variant is fatal for a run: a one-shot batch tool has nothing to
//! retry, and dropping a panel would misrepresent the comparison. Variants
//! carry enough context (variant key, expected vs. actual shape, artifact
//! name) to diagnose a failure without reading the code.

use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

use crate::dataset::Variant;

/// Rendering pipeline errors.
#[derive(Error, Debug)]
pub enum PlotError {
    /// A required timing dataset is absent from the data directory.
    #[error("Missing dataset for {variant}: {} does not exist", path.display())]
    MissingDataset {
        /// Variant whose dataset was requested.
        variant: Variant,
        /// Location that was probed.
        path: PathBuf,
    },

    /// A dataset's dimensions disagree with the parameter mesh.
    #[error(
        "Shape mismatch for {variant}: expected {}x{}, found {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    ShapeMismatch {
        /// Variant whose dataset is malformed.
        variant: Variant,
        /// Mesh shape as (buffer samples, delay samples).
        expected: (usize, usize),
        /// Shape of the loaded array.
        actual: (usize, usize),
    },

    /// The dataset file exists but is not a readable 2D `f64` array.
    #[error("Failed to read dataset for {variant}: {reason}")]
    DatasetRead {
        /// Variant whose dataset could not be decoded.
        variant: Variant,
        /// Decoder message.
        reason: String,
    },

    /// An image artifact could not be written.
    #[error("Failed to write {artifact}: {reason}")]
    Write {
        /// Artifact file name.
        artifact: String,
        /// Underlying failure.
        reason: String,
    },

    /// Drawing backend failure.
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PlotError>;

impl<E> From<DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(err.to_string())
    }
}

impl From<toml::de::Error> for PlotError {
    fn from(err: toml::de::Error) -> Self {
        PlotError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PlotError {
    fn from(err: toml::ser::Error) -> Self {
        PlotError::Config(err.to_string())
    }
}
