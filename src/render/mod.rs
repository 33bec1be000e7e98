//! Surface rendering.
//!
//! Rendering is split in two steps. [`SurfaceRenderer::render`] turns a
//! dataset into a [`Surface`]: colored, height-clamped faces plus the
//! presentation policy. [`Surface::draw`] rasterizes that onto any plotters
//! drawing area. Building every surface before drawing any of them lets the
//! composer reject bad input before the first file is touched.

mod colorbar;

pub use colorbar::ColorBar;

use std::ops::Range;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::TextStyle;
use serde::{Deserialize, Serialize};

use crate::colormap::ColorScale;
use crate::dataset::{TimingDataset, Variant};
use crate::error::Result;
use crate::grid::ParameterMesh;
use crate::normalize::NormalizationBound;

/// Label of the delay axis.
pub const DELAY_LABEL: &str = "Latency (ms)";
/// Label of the buffer-size axis.
pub const BUFFER_LABEL: &str = "Bandwidth (bytes)";
/// Label of the height axis.
pub const HEIGHT_LABEL: &str = "Handshake time (ms)";

/// Distance of the axis titles beyond their axis, as a fraction of its span.
const TITLE_OFFSET: f64 = 0.3;

/// Font used for captions and labels.
pub(crate) const FONT: &str = "sans-serif";

/// Viewing angle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Rotation around the vertical axis
    pub azimuth_deg: f64,
    /// Angle above the delay/buffer plane
    pub elevation_deg: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            azimuth_deg: 135.0,
            elevation_deg: 30.0,
        }
    }
}

/// Presentation applied identically to every panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPolicy {
    /// Displayed height range; data outside it is clipped on screen only
    pub z_min: f64,
    /// Upper end of the displayed height range
    pub z_max: f64,
    /// Camera for all panels
    pub camera: Camera,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            z_min: 0.0,
            z_max: 10000.0,
            camera: Camera::default(),
        }
    }
}

/// One quadrilateral of the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Corners as `(delay, buffer, height)`, height already clamped
    pub corners: [(f64, f64, f64); 4],
    /// Fill color from the mean of the unclamped corner values
    pub color: RGBColor,
}

/// A renderable 3D surface for one variant.
#[derive(Debug, Clone)]
pub struct Surface {
    variant: Variant,
    title: String,
    faces: Vec<Face>,
    delay_range: Range<f64>,
    buffer_range: Range<f64>,
    policy: RenderPolicy,
    bound: NormalizationBound,
}

impl Surface {
    /// Variant shown.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Panel title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Faces in back-to-front order for the configured camera.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Bound the face colors were normalized against.
    pub fn bound(&self) -> NormalizationBound {
        self.bound
    }

    /// Presentation policy.
    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    /// Axis titles with their `(delay, height, buffer)` chart positions.
    ///
    /// Titles sit past the edges that carry the tick labels.
    pub fn axis_titles(&self) -> [(&'static str, (f64, f64, f64)); 3] {
        let z_range = self.policy.z_min..self.policy.z_max;
        let mid = |r: &Range<f64>| (r.start + r.end) / 2.0;
        let past_start = |r: &Range<f64>| r.start - TITLE_OFFSET * (r.end - r.start);
        let past_end = |r: &Range<f64>| r.end + TITLE_OFFSET * (r.end - r.start);
        [
            (
                DELAY_LABEL,
                (mid(&self.delay_range), z_range.start, past_start(&self.buffer_range)),
            ),
            (
                BUFFER_LABEL,
                (past_end(&self.delay_range), z_range.start, mid(&self.buffer_range)),
            ),
            (
                HEIGHT_LABEL,
                (self.delay_range.start, past_end(&z_range), self.buffer_range.end),
            ),
        ]
    }

    /// Rasterize onto `area`.
    pub fn draw<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let z_range = self.policy.z_min..self.policy.z_max;
        let camera = self.policy.camera;

        // plotters' vertical axis is y, so the chart is (delay, height, buffer).
        let mut chart = ChartBuilder::on(area)
            .caption(&self.title, (FONT, 16))
            .margin(10)
            .build_cartesian_3d(
                self.delay_range.clone(),
                z_range.clone(),
                self.buffer_range.clone(),
            )?;

        chart.with_projection(|mut pb| {
            pb.yaw = camera.azimuth_deg.to_radians();
            pb.pitch = camera.elevation_deg.to_radians();
            pb.scale = 0.7;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.1))
            .max_light_lines(3)
            .draw()?;

        chart.draw_series(self.faces.iter().map(|face| {
            Polygon::new(
                face.corners
                    .iter()
                    .map(|&(delay, buffer, height)| (delay, height, buffer))
                    .collect::<Vec<_>>(),
                face.color.filled(),
            )
        }))?;

        let style =
            TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(
            self.axis_titles()
                .into_iter()
                .map(|(text, pos)| Text::new(text, pos, style.clone())),
        )?;

        Ok(())
    }
}

/// Builds surfaces that share one mesh, color scale, bound and policy.
///
/// One renderer is created per figure; every panel of that figure goes
/// through it, so the panels cannot disagree on normalization.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceRenderer<'a> {
    mesh: &'a ParameterMesh,
    scale: &'a ColorScale,
    bound: NormalizationBound,
    policy: RenderPolicy,
}

impl<'a> SurfaceRenderer<'a> {
    /// Renderer for one figure.
    pub fn new(
        mesh: &'a ParameterMesh,
        scale: &'a ColorScale,
        bound: NormalizationBound,
        policy: RenderPolicy,
    ) -> Self {
        Self {
            mesh,
            scale,
            bound,
            policy,
        }
    }

    /// Shared color scale.
    pub fn scale(&self) -> &'a ColorScale {
        self.scale
    }

    /// Shared bound.
    pub fn bound(&self) -> NormalizationBound {
        self.bound
    }

    /// Build the surface for `dataset`.
    ///
    /// Fails with `ShapeMismatch` if the dataset does not cover the mesh.
    pub fn render(&self, dataset: &TimingDataset) -> Result<Surface> {
        dataset.ensure_shape(self.mesh)?;

        let delay = self.mesh.delay_grid();
        let buffer = self.mesh.buffer_grid();
        let values = dataset.values();
        let (rows, cols) = self.mesh.shape();
        let clamp = |h: f64| {
            if h.is_finite() {
                h.clamp(self.policy.z_min, self.policy.z_max)
            } else {
                self.policy.z_min
            }
        };

        let mut faces = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1));
        for i in 0..rows.saturating_sub(1) {
            for j in 0..cols.saturating_sub(1) {
                let cell = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
                let mean = cell.iter().map(|&idx| values[idx]).sum::<f64>() / 4.0;
                faces.push(Face {
                    corners: cell.map(|idx| (delay[idx], buffer[idx], clamp(values[idx]))),
                    color: self.scale.map(mean, self.bound),
                });
            }
        }

        let delay_axis = self.mesh.delay_axis();
        let buffer_axis = self.mesh.buffer_axis();
        let delay_range = span(delay_axis.min(), delay_axis.max());
        let buffer_range = span(buffer_axis.min(), buffer_axis.max());

        sort_back_to_front(&mut faces, &delay_range, &buffer_range, self.policy.camera);

        Ok(Surface {
            variant: dataset.variant(),
            title: dataset.variant().title().to_string(),
            faces,
            delay_range,
            buffer_range,
            policy: self.policy,
            bound: self.bound,
        })
    }
}

/// Axis range with a non-zero width, so single-sample axes still draw.
fn span(min: f64, max: f64) -> Range<f64> {
    if max > min {
        min..max
    } else {
        min - 0.5..max + 0.5
    }
}

/// Painter's order: faces farthest from the camera first.
fn sort_back_to_front(
    faces: &mut [Face],
    delay_range: &Range<f64>,
    buffer_range: &Range<f64>,
    camera: Camera,
) {
    let (sin, cos) = camera.azimuth_deg.to_radians().sin_cos();
    let depth = |face: &Face| {
        let (d, b) = face
            .corners
            .iter()
            .fold((0.0, 0.0), |(d, b), c| (d + c.0 / 4.0, b + c.1 / 4.0));
        let u = (d - delay_range.start) / (delay_range.end - delay_range.start) - 0.5;
        let v = (b - buffer_range.start) / (buffer_range.end - buffer_range.start) - 0.5;
        u * cos + v * sin
    };
    faces.sort_by(|a, b| depth(a).total_cmp(&depth(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use ndarray::Array2;

    fn renderer<'a>(
        mesh: &'a ParameterMesh,
        scale: &'a ColorScale,
        bound: f64,
    ) -> SurfaceRenderer<'a> {
        SurfaceRenderer::new(
            mesh,
            scale,
            NormalizationBound::new(bound),
            RenderPolicy::default(),
        )
    }

    #[test]
    fn test_surface_has_one_face_per_cell() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PqcTls, Array2::from_elem(mesh.shape(), 500.0));

        let surface = renderer(&mesh, &scale, 1000.0).render(&ds).unwrap();
        assert_eq!(surface.faces().len(), 19 * 19);
        assert_eq!(surface.title(), "Post-quantum algorithm");
        assert_eq!(surface.variant(), Variant::PqcTls);
    }

    #[test]
    fn test_heights_are_clamped_for_display_only() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PlainTls, Array2::from_elem(mesh.shape(), 25000.0));

        let surface = renderer(&mesh, &scale, 25000.0).render(&ds).unwrap();
        for face in surface.faces() {
            assert!(face.corners.iter().all(|c| c.2 == 10000.0));
            // colour still reflects the real value
            assert_eq!(face.color, scale.last());
        }
        assert_eq!(ds.max_value(), Some(25000.0));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PqcWithCaching, Array2::zeros((10, 20)));

        let err = renderer(&mesh, &scale, 1.0).render(&ds).unwrap_err();
        assert!(matches!(
            err,
            PlotError::ShapeMismatch {
                variant: Variant::PqcWithCaching,
                expected: (20, 20),
                actual: (10, 20),
            }
        ));
    }

    #[test]
    fn test_zero_bound_renders_first_anchor() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PlainTls, Array2::zeros(mesh.shape()));

        let surface = renderer(&mesh, &scale, 0.0).render(&ds).unwrap();
        assert!(surface.faces().iter().all(|f| f.color == scale.first()));
    }

    #[test]
    fn test_faces_are_sorted_for_camera() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PlainTls, Array2::zeros(mesh.shape()));

        let surface = renderer(&mesh, &scale, 1.0).render(&ds).unwrap();
        // at 135 degrees the far corner is high delay, low buffer
        let first = &surface.faces()[0];
        let last = &surface.faces()[surface.faces().len() - 1];
        assert!(first.corners[0].0 > last.corners[0].0);
        assert!(first.corners[0].1 < last.corners[0].1);
    }

    #[test]
    fn test_draw_onto_bitmap() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(
            Variant::PqcTls,
            Array2::from_shape_fn(mesh.shape(), |(i, j)| (i * 100 + j * 10) as f64),
        );
        let surface = renderer(&mesh, &scale, 2000.0).render(&ds).unwrap();

        let (w, h) = (320u32, 240u32);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            surface.draw(&root).unwrap();
            root.present().unwrap();
        }
        assert!(buf.chunks(3).any(|px| px != [255, 255, 255]));
    }

    #[test]
    fn test_axis_titles_clear_tick_edges() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PqcTls, Array2::zeros(mesh.shape()));
        let surface = renderer(&mesh, &scale, 1.0).render(&ds).unwrap();
        let [delay, buffer, height] = surface.axis_titles();

        assert_eq!(delay.0, DELAY_LABEL);
        assert!(delay.1 .2 < surface.buffer_range.start);
        assert_eq!(buffer.0, BUFFER_LABEL);
        assert!(buffer.1 .0 > surface.delay_range.end);
        assert_eq!(height.0, HEIGHT_LABEL);
        assert!(height.1 .1 > surface.policy.z_max);
    }

    #[test]
    fn test_draw_renders_title_text() {
        let mesh = ParameterMesh::default();
        let scale = ColorScale::default();
        let ds = TimingDataset::new(Variant::PlainTls, Array2::zeros(mesh.shape()));
        let surface = renderer(&mesh, &scale, 0.0).render(&ds).unwrap();

        let (w, h) = (320u32, 240u32);
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            surface.draw(&root).unwrap();
            root.present().unwrap();
        }

        // the caption band above the chart holds only the black title glyphs
        let caption_band = &buf[..(w * 24 * 3) as usize];
        assert!(caption_band
            .chunks(3)
            .any(|px| px[0] < 96 && px[1] < 96 && px[2] < 96));
    }
}
