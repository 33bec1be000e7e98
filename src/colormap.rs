//! Piecewise-linear color gradient shared by every surface in a run.
//!
//! The default anchors put four of five color stops in the lowest fifth of
//! the range, so fast handshakes stay distinguishable next to a handful of
//! slow outlier cells.

use plotters::style::RGBColor;

use crate::error::{PlotError, Result};
use crate::normalize::NormalizationBound;

/// Default gradient: magenta, blue, green, yellow, red.
pub const DEFAULT_ANCHORS: [(f64, &str); 5] = [
    (0.0, "#ff00ff"),
    (0.05, "#0000ff"),
    (0.1, "#00ff00"),
    (0.2, "#ffff00"),
    (1.0, "#ff0000"),
];

/// One fixed point of the gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Fraction of the normalization range, in `[0, 1]`
    pub position: f64,
    /// Color at that fraction
    pub color: RGBColor,
}

/// Ordered anchors interpolated linearly in RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    anchors: Vec<Anchor>,
}

impl ColorScale {
    /// Build a scale, checking that positions are strictly increasing from 0 to 1.
    pub fn new(anchors: Vec<Anchor>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(PlotError::Config(
                "color scale needs at least two anchors".to_string(),
            ));
        }
        if anchors[0].position != 0.0 || anchors[anchors.len() - 1].position != 1.0 {
            return Err(PlotError::Config(
                "color scale must start at 0 and end at 1".to_string(),
            ));
        }
        if anchors.windows(2).any(|w| w[0].position >= w[1].position) {
            return Err(PlotError::Config(
                "color scale positions must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { anchors })
    }

    /// Build a scale from `(position, "#rrggbb")` pairs.
    pub fn from_hex(anchors: &[(f64, &str)]) -> Result<Self> {
        let anchors = anchors
            .iter()
            .map(|&(position, hex)| {
                Ok(Anchor {
                    position,
                    color: parse_hex(hex)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(anchors)
    }

    /// Anchors in position order.
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Color at the bottom of the range.
    pub fn first(&self) -> RGBColor {
        self.anchors[0].color
    }

    /// Color at the top of the range.
    pub fn last(&self) -> RGBColor {
        self.anchors[self.anchors.len() - 1].color
    }

    /// Fraction of `[0, bound]` covered by `value`, clamped to `[0, 1]`.
    ///
    /// A degenerate bound or a non-finite value maps to 0.
    pub fn fraction(value: f64, bound: NormalizationBound) -> f64 {
        if bound.is_degenerate() || !value.is_finite() {
            return 0.0;
        }
        (value / bound.value()).clamp(0.0, 1.0)
    }

    /// Color for `value` normalized against `bound`.
    pub fn map(&self, value: f64, bound: NormalizationBound) -> RGBColor {
        self.color_at(Self::fraction(value, bound))
    }

    /// Color at a fraction of the range.
    pub fn color_at(&self, fraction: f64) -> RGBColor {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let segment = self
            .anchors
            .windows(2)
            .find(|w| f <= w[1].position)
            .unwrap_or(&self.anchors[self.anchors.len() - 2..]);
        let (lo, hi) = (segment[0], segment[1]);

        let t = (f - lo.position) / (hi.position - lo.position);
        RGBColor(
            lerp(lo.color.0, hi.color.0, t),
            lerp(lo.color.1, hi.color.1, t),
            lerp(lo.color.2, hi.color.2, t),
        )
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::from_hex(&DEFAULT_ANCHORS).expect("default anchors are valid")
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Result<RGBColor> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(PlotError::Config(format!("invalid color '{hex}'")));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| PlotError::Config(format!("invalid color '{hex}'")))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGENTA: RGBColor = RGBColor(0xff, 0x00, 0xff);
    const RED: RGBColor = RGBColor(0xff, 0x00, 0x00);

    #[test]
    fn test_default_anchor_layout() {
        let scale = ColorScale::default();
        let positions: Vec<f64> = scale.anchors().iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![0.0, 0.05, 0.1, 0.2, 1.0]);
        assert_eq!(scale.first(), MAGENTA);
        assert_eq!(scale.last(), RED);
    }

    #[test]
    fn test_bound_maps_to_top_and_zero_to_bottom() {
        let scale = ColorScale::default();
        let bound = NormalizationBound::new(3200.0);
        assert_eq!(scale.map(3200.0, bound), RED);
        assert_eq!(scale.map(0.0, bound), MAGENTA);
    }

    #[test]
    fn test_saturates_outside_range() {
        let scale = ColorScale::default();
        let bound = NormalizationBound::new(100.0);
        assert_eq!(scale.map(1e9, bound), RED);
        assert_eq!(scale.map(-5.0, bound), MAGENTA);
        assert_eq!(scale.map(f64::NAN, bound), MAGENTA);
    }

    #[test]
    fn test_zero_bound_uses_first_anchor() {
        let scale = ColorScale::default();
        let bound = NormalizationBound::new(0.0);
        assert_eq!(scale.map(0.0, bound), MAGENTA);
        assert_eq!(scale.map(250.0, bound), MAGENTA);
    }

    #[test]
    fn test_interior_anchors_hit_exactly() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_at(0.05), RGBColor(0, 0, 0xff));
        assert_eq!(scale.color_at(0.1), RGBColor(0, 0xff, 0));
        assert_eq!(scale.color_at(0.2), RGBColor(0xff, 0xff, 0));
    }

    #[test]
    fn test_interpolates_between_anchors() {
        let scale = ColorScale::default();
        // halfway between yellow (0.2) and red (1.0)
        assert_eq!(scale.color_at(0.6), RGBColor(0xff, 0x80, 0x00));
    }

    #[test]
    fn test_rejects_bad_anchor_lists() {
        let c = RGBColor(0, 0, 0);
        let anchor = |position| Anchor { position, color: c };

        assert!(ColorScale::new(vec![anchor(0.0)]).is_err());
        assert!(ColorScale::new(vec![anchor(0.1), anchor(1.0)]).is_err());
        assert!(ColorScale::new(vec![anchor(0.0), anchor(0.9)]).is_err());
        assert!(ColorScale::new(vec![anchor(0.0), anchor(0.5), anchor(0.5), anchor(1.0)]).is_err());
        assert!(ColorScale::new(vec![anchor(0.0), anchor(1.0)]).is_ok());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#00ff7f").unwrap(), RGBColor(0, 0xff, 0x7f));
        assert_eq!(parse_hex("0000ff").unwrap(), RGBColor(0, 0, 0xff));
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
    }
}
