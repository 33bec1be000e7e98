//! Shared color normalization.
//!
//! One bound is resolved per figure, over exactly the datasets that figure
//! shows, and handed to every panel of that figure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetSet, TimingDataset, Variant};

/// Upper limit of the color mapping shared by jointly displayed datasets.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizationBound(f64);

impl NormalizationBound {
    /// Wrap a raw value; negative and non-finite inputs collapse to 0.
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self(0.0)
        }
    }

    /// Maximum finite value across `datasets`; 0 when there is nothing to scan.
    pub fn resolve<'a>(datasets: impl IntoIterator<Item = &'a TimingDataset>) -> Self {
        let max = datasets
            .into_iter()
            .filter_map(TimingDataset::max_value)
            .fold(0.0, f64::max);
        Self::new(max)
    }

    /// Bound over the listed variants of `set`; variants not loaded are skipped.
    pub fn resolve_for(set: &DatasetSet, variants: &[Variant]) -> Self {
        Self::resolve(variants.iter().filter_map(|v| set.get(*v)))
    }

    /// Bound over every loaded dataset except the `excluded` variants.
    pub fn resolve_excluding(set: &DatasetSet, excluded: &[Variant]) -> Self {
        Self::resolve(set.iter().filter(|d| !excluded.contains(&d.variant())))
    }

    /// Raw bound value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// A zero bound maps every value to the first anchor color.
    pub fn is_degenerate(&self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for NormalizationBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn dataset(variant: Variant, max: f64) -> TimingDataset {
        TimingDataset::new(variant, array![[0.0, 1.0], [max, 2.0]])
    }

    #[test]
    fn test_bound_is_maximum_across_datasets() {
        let a = dataset(Variant::PlainTls, 5.0);
        let b = dataset(Variant::PqcTls, 9.0);
        assert_eq!(NormalizationBound::resolve([&a, &b]).value(), 9.0);
    }

    #[test]
    fn test_excluded_dataset_does_not_move_bound() {
        let set: DatasetSet = [
            dataset(Variant::PlainTls, 5.0),
            dataset(Variant::PqcTls, 9.0),
            dataset(Variant::ClientCachingTls, 3.0),
        ]
        .into_iter()
        .collect();

        let bound = NormalizationBound::resolve_excluding(&set, &[Variant::ClientCachingTls]);
        assert_eq!(bound.value(), 9.0);

        let shown = NormalizationBound::resolve_for(&set, &[Variant::PlainTls, Variant::PqcTls]);
        assert_eq!(shown, bound);
    }

    #[test]
    fn test_excluded_outlier_is_not_counted() {
        let set: DatasetSet = [
            dataset(Variant::PlainTls, 5.0),
            dataset(Variant::ClientCachingTls, 500.0),
        ]
        .into_iter()
        .collect();

        let bound = NormalizationBound::resolve_excluding(&set, &[Variant::ClientCachingTls]);
        assert_eq!(bound.value(), 5.0);
    }

    #[test]
    fn test_degenerate_inputs_yield_zero() {
        assert_eq!(NormalizationBound::resolve(std::iter::empty()).value(), 0.0);

        let zeros = TimingDataset::new(Variant::PlainTls, Array2::zeros((20, 20)));
        let bound = NormalizationBound::resolve([&zeros]);
        assert_eq!(bound.value(), 0.0);
        assert!(bound.is_degenerate());

        let empty = TimingDataset::new(Variant::PqcTls, Array2::zeros((0, 0)));
        assert_eq!(NormalizationBound::resolve([&empty]).value(), 0.0);
    }

    #[test]
    fn test_negative_values_floor_at_zero() {
        let ds = TimingDataset::new(Variant::PlainTls, array![[-4.0, -1.0]]);
        assert_eq!(NormalizationBound::resolve([&ds]).value(), 0.0);
        assert_eq!(NormalizationBound::new(f64::NAN).value(), 0.0);
    }
}
