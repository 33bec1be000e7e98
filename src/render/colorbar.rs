use plotters::coord::Shift;
use plotters::prelude::*;

use super::FONT;
use crate::colormap::ColorScale;
use crate::error::Result;
use crate::normalize::NormalizationBound;

/// Vertical strips used to paint the gradient.
const STEPS: usize = 256;

/// Vertical legend for a color scale over `[0, bound]`.
#[derive(Debug, Clone, Copy)]
pub struct ColorBar<'a> {
    scale: &'a ColorScale,
    bound: NormalizationBound,
}

impl<'a> ColorBar<'a> {
    /// Legend for `scale` normalized against `bound`.
    pub fn new(scale: &'a ColorScale, bound: NormalizationBound) -> Self {
        Self { scale, bound }
    }

    /// Top of the labelled range. A zero bound still gets a unit-height bar.
    pub fn top(&self) -> f64 {
        if self.bound.is_degenerate() {
            1.0
        } else {
            self.bound.value()
        }
    }

    /// Rasterize onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let top = self.top();

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .margin_right(4)
            .y_label_area_size(48)
            .build_cartesian_2d(0f64..1f64, 0f64..top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .disable_x_axis()
            .y_labels(6)
            .y_label_style((FONT, 11).into_font())
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        let step = top / STEPS as f64;
        chart.draw_series((0..STEPS).map(|i| {
            let lo = step * i as f64;
            let color = self.scale.map(lo + step / 2.0, self.bound);
            Rectangle::new([(0.0, lo), (1.0, lo + step)], color.filled())
        }))?;

        Ok(())
    }
}
