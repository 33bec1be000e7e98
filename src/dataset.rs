//! Algorithm variants and their persisted timing datasets.
//!
//! Each variant's handshake timings live in `<data dir>/<key>.npy` as a 2D
//! `f64` array indexed `[buffer, delay]`. Datasets are read once, validated
//! against the mesh and then only ever borrowed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::Array2;
use ndarray_npy::read_npy;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::grid::ParameterMesh;

/// Extension of the persisted arrays.
pub const DATASET_EXTENSION: &str = "npy";

/// Algorithm configuration under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Classical signatures
    PlainTls,
    /// Post-quantum signatures
    PqcTls,
    /// Post-quantum with server-side caching
    PqcWithCaching,
    /// Post-quantum with client-side caching
    ClientCachingTls,
}

impl Variant {
    /// Every known variant, in the order the per-variant figures are drawn.
    pub const ALL: [Variant; 4] = [
        Variant::PlainTls,
        Variant::PqcTls,
        Variant::ClientCachingTls,
        Variant::PqcWithCaching,
    ];

    /// File identifier used by the benchmark that produced the data.
    pub fn key(&self) -> &'static str {
        match self {
            Variant::PlainTls => "plain-tls",
            Variant::PqcTls => "pqc-tls",
            Variant::PqcWithCaching => "pqc-with-caching",
            Variant::ClientCachingTls => "client-caching-tls",
        }
    }

    /// Dataset file name, e.g. `pqc-tls.npy`.
    pub fn file_name(&self) -> String {
        format!("{}.{DATASET_EXTENSION}", self.key())
    }

    /// Panel title.
    pub fn title(&self) -> &'static str {
        match self {
            Variant::PlainTls => "Classical algorithm",
            Variant::PqcTls => "Post-quantum algorithm",
            Variant::PqcWithCaching => "Post-quantum algorithm and server-side caching",
            Variant::ClientCachingTls => "Post-quantum algorithm and client-side caching",
        }
    }

    /// Stem of the standalone figure written for this variant.
    pub fn figure_stem(&self) -> &'static str {
        match self {
            Variant::PlainTls => "fig_plain",
            Variant::PqcTls => "fig_pqc",
            Variant::PqcWithCaching => "fig_caching",
            Variant::ClientCachingTls => "fig_client_caching",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Variant {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .into_iter()
            .find(|v| v.key() == s)
            .ok_or_else(|| {
                PlotError::Config(format!(
                    "unknown variant '{s}' (expected one of: plain-tls, pqc-tls, pqc-with-caching, client-caching-tls)"
                ))
            })
    }
}

/// Measured handshake durations for one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingDataset {
    variant: Variant,
    values: Array2<f64>,
}

impl TimingDataset {
    /// Wrap an in-memory array.
    pub fn new(variant: Variant, values: Array2<f64>) -> Self {
        Self { variant, values }
    }

    /// Variant this dataset belongs to.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Raw timings indexed `[buffer, delay]`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// `(rows, cols)` of the underlying array.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Largest finite timing, `None` for an empty or all-NaN array.
    pub fn max_value(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    /// Smallest finite timing, `None` for an empty or all-NaN array.
    pub fn min_value(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .reduce(f64::min)
    }

    /// Fail with [`PlotError::ShapeMismatch`] unless the array matches the mesh.
    pub fn ensure_shape(&self, mesh: &ParameterMesh) -> Result<()> {
        let expected = mesh.shape();
        let actual = self.shape();
        if expected != actual {
            return Err(PlotError::ShapeMismatch {
                variant: self.variant,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Loaded datasets keyed by variant.
#[derive(Debug, Clone, Default)]
pub struct DatasetSet {
    datasets: BTreeMap<Variant, TimingDataset>,
}

impl DatasetSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset.
    pub fn insert(&mut self, dataset: TimingDataset) {
        self.datasets.insert(dataset.variant(), dataset);
    }

    /// Dataset for `variant`, if loaded.
    pub fn get(&self, variant: Variant) -> Option<&TimingDataset> {
        self.datasets.get(&variant)
    }

    /// Dataset for `variant`, failing with [`PlotError::MissingDataset`].
    pub fn require(&self, variant: Variant) -> Result<&TimingDataset> {
        self.get(variant).ok_or_else(|| PlotError::MissingDataset {
            variant,
            path: PathBuf::from(variant.file_name()),
        })
    }

    /// Loaded datasets in variant order.
    pub fn iter(&self) -> impl Iterator<Item = &TimingDataset> {
        self.datasets.values()
    }

    /// Number of loaded datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// True when nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl FromIterator<TimingDataset> for DatasetSet {
    fn from_iter<I: IntoIterator<Item = TimingDataset>>(iter: I) -> Self {
        let mut set = Self::new();
        for dataset in iter {
            set.insert(dataset);
        }
        set
    }
}

/// Reads variant datasets from a directory.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    dir: PathBuf,
}

impl DatasetLoader {
    /// Loader rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory datasets are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of a variant's dataset.
    pub fn path_for(&self, variant: Variant) -> PathBuf {
        self.dir.join(variant.file_name())
    }

    /// Read one dataset and check it against the mesh.
    pub fn load(&self, variant: Variant, mesh: &ParameterMesh) -> Result<TimingDataset> {
        let path = self.path_for(variant);
        if !path.is_file() {
            return Err(PlotError::MissingDataset { variant, path });
        }

        let values: Array2<f64> = read_npy(&path).map_err(|e| PlotError::DatasetRead {
            variant,
            reason: format!("{}: {e}", path.display()),
        })?;

        let dataset = TimingDataset::new(variant, values);
        dataset.ensure_shape(mesh)?;

        tracing::debug!(
            "Loaded {} ({}x{}) from {}",
            variant,
            dataset.shape().0,
            dataset.shape().1,
            path.display()
        );
        Ok(dataset)
    }

    /// Read every listed variant, stopping at the first failure.
    pub fn load_all(
        &self,
        variants: impl IntoIterator<Item = Variant>,
        mesh: &ParameterMesh,
    ) -> Result<DatasetSet> {
        variants
            .into_iter()
            .map(|variant| self.load(variant, mesh))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::write_npy;

    #[test]
    fn test_variant_keys_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.key().parse::<Variant>().unwrap(), variant);
        }
        assert!("rsa-tls".parse::<Variant>().is_err());
    }

    #[test]
    fn test_variant_serde_uses_file_keys() {
        let json = serde_json::to_string(&Variant::PqcWithCaching).unwrap();
        assert_eq!(json, "\"pqc-with-caching\"");
        let parsed: Variant = serde_json::from_str("\"client-caching-tls\"").unwrap();
        assert_eq!(parsed, Variant::ClientCachingTls);
    }

    #[test]
    fn test_dataset_extrema_skip_nan() {
        let ds = TimingDataset::new(Variant::PlainTls, array![[1.0, f64::NAN], [7.5, 3.0]]);
        assert_eq!(ds.max_value(), Some(7.5));
        assert_eq!(ds.min_value(), Some(1.0));
    }

    #[test]
    fn test_load_reads_npy() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = ParameterMesh::default();
        write_npy(
            dir.path().join("pqc-tls.npy"),
            &Array2::<f64>::from_elem(mesh.shape(), 42.0),
        )
        .unwrap();

        let loader = DatasetLoader::new(dir.path());
        let ds = loader.load(Variant::PqcTls, &mesh).unwrap();
        assert_eq!(ds.variant(), Variant::PqcTls);
        assert_eq!(ds.shape(), (20, 20));
        assert_eq!(ds.max_value(), Some(42.0));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(dir.path());
        let err = loader
            .load(Variant::PlainTls, &ParameterMesh::default())
            .unwrap_err();
        match err {
            PlotError::MissingDataset { variant, path } => {
                assert_eq!(variant, Variant::PlainTls);
                assert_eq!(path, dir.path().join("plain-tls.npy"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        write_npy(
            dir.path().join("plain-tls.npy"),
            &Array2::<f64>::zeros((20, 19)),
        )
        .unwrap();

        let err = DatasetLoader::new(dir.path())
            .load(Variant::PlainTls, &ParameterMesh::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PlotError::ShapeMismatch {
                expected: (20, 20),
                actual: (20, 19),
                ..
            }
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pqc-tls.npy"), b"not an array").unwrap();

        let err = DatasetLoader::new(dir.path())
            .load(Variant::PqcTls, &ParameterMesh::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::DatasetRead { .. }));
    }

    #[test]
    fn test_load_all_fails_on_first_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = ParameterMesh::default();
        write_npy(
            dir.path().join("plain-tls.npy"),
            &Array2::<f64>::zeros(mesh.shape()),
        )
        .unwrap();

        let err = DatasetLoader::new(dir.path())
            .load_all([Variant::PlainTls, Variant::PqcTls], &mesh)
            .unwrap_err();
        assert!(matches!(
            err,
            PlotError::MissingDataset {
                variant: Variant::PqcTls,
                ..
            }
        ));
    }

    #[test]
    fn test_require_reports_missing_variant() {
        let set = DatasetSet::new();
        assert!(set.is_empty());
        assert!(matches!(
            set.require(Variant::PqcTls),
            Err(PlotError::MissingDataset { .. })
        ));
    }
}
