//! Figure composition and artifact output.
//!
//! Both layouts consume surfaces built by one [`SurfaceRenderer`], so every
//! panel and the color bar of a figure share a single scale and bound.
//! All surfaces are built and rasterized in memory before the first file is
//! written.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use image::{ImageFormat, RgbImage, RgbaImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::colormap::ColorScale;
use crate::dataset::{DatasetSet, Variant};
use crate::error::{PlotError, Result};
use crate::grid::ParameterMesh;
use crate::normalize::NormalizationBound;
use crate::render::{ColorBar, RenderPolicy, Surface, SurfaceRenderer};

/// File stem of the standalone color bar.
pub const COLORBAR_STEM: &str = "fig_cb";
/// File stem of the combined figure.
pub const COMBINED_STEM: &str = "fig_combined";

/// How surfaces are arranged into figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositionMode {
    /// One figure per variant plus a separate color-bar figure
    PerVariant,
    /// All variants side by side with one color-bar panel
    Combined,
}

impl CompositionMode {
    /// Every mode, in the order a full run produces them.
    pub const ALL: [CompositionMode; 2] = [CompositionMode::PerVariant, CompositionMode::Combined];

    /// Identifier used on the command line and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::PerVariant => "per-variant",
            CompositionMode::Combined => "combined",
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompositionMode {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "per-variant" | "per_variant" | "standalone" => Ok(CompositionMode::PerVariant),
            "combined" | "multi" => Ok(CompositionMode::Combined),
            _ => Err(PlotError::Config(format!(
                "unknown mode '{s}' (expected per-variant or combined)"
            ))),
        }
    }
}

/// Pixel dimensions of the generated figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureLayout {
    /// Width of a standalone variant figure
    pub panel_width: u32,
    /// Height of a standalone variant figure and of the color-bar figure
    pub panel_height: u32,
    /// Width of the standalone color-bar figure
    pub colorbar_width: u32,
    /// Width of one panel in the combined figure
    pub combined_panel_width: u32,
    /// Height of the combined figure
    pub combined_height: u32,
    /// Width of the color-bar panel in the combined figure
    pub combined_colorbar_width: u32,
    /// Horizontal gap between combined panels
    pub panel_padding: u32,
}

impl Default for FigureLayout {
    fn default() -> Self {
        Self {
            panel_width: 640,
            panel_height: 480,
            colorbar_width: 110,
            combined_panel_width: 520,
            combined_height: 520,
            combined_colorbar_width: 90,
            panel_padding: 16,
        }
    }
}

impl FigureLayout {
    /// Reject zero-sized figures.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("panel_width", self.panel_width),
            ("panel_height", self.panel_height),
            ("colorbar_width", self.colorbar_width),
            ("combined_panel_width", self.combined_panel_width),
            ("combined_height", self.combined_height),
            ("combined_colorbar_width", self.combined_colorbar_width),
        ];
        match sizes.iter().find(|(_, v)| *v == 0) {
            Some((name, _)) => Err(PlotError::Config(format!("layout.{name} must be positive"))),
            None => Ok(()),
        }
    }

    /// Total size of a combined figure with `panels` panels.
    pub fn combined_size(&self, panels: usize) -> (u32, u32) {
        let panels = panels as u32;
        let width = panels * self.combined_panel_width
            + panels.saturating_sub(1) * self.panel_padding
            + self.combined_colorbar_width;
        (width, self.combined_height)
    }
}

/// What an artifact shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "variant")]
pub enum ArtifactKind {
    /// Standalone figure for one variant
    Variant(Variant),
    /// Standalone color bar
    ColorBar,
    /// Multi-panel figure
    Combined,
}

/// An image written by the composer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// What the image shows
    #[serde(flatten)]
    pub kind: ArtifactKind,
    /// Where it was written
    pub path: PathBuf,
}

impl Artifact {
    /// File name of the artifact.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A rasterized figure waiting to be written.
enum Bitmap {
    Opaque(RgbImage),
    Transparent(RgbaImage),
}

struct PendingFigure {
    kind: ArtifactKind,
    file_name: String,
    bitmap: Bitmap,
}

/// Arranges surfaces into figures and writes them as PNG files.
#[derive(Debug, Clone)]
pub struct FigureComposer {
    out_dir: PathBuf,
    layout: FigureLayout,
    policy: RenderPolicy,
    transparent_combined: bool,
    preview_command: Option<String>,
}

impl FigureComposer {
    /// Composer writing into `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            layout: FigureLayout::default(),
            policy: RenderPolicy::default(),
            transparent_combined: true,
            preview_command: None,
        }
    }

    /// Set figure sizes
    pub fn with_layout(mut self, layout: FigureLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the presentation policy handed to every surface
    pub fn with_policy(mut self, policy: RenderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Save the combined figure with an opaque or transparent background
    pub fn with_transparent_combined(mut self, transparent: bool) -> Self {
        self.transparent_combined = transparent;
        self
    }

    /// Open the combined figure with `command` once saved
    pub fn with_preview(mut self, command: Option<String>) -> Self {
        self.preview_command = command;
        self
    }

    /// Output directory.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Render `variants` in `mode` and write the resulting images.
    ///
    /// `bound` must already cover exactly `variants`; it is used unchanged
    /// for every panel and the color bar.
    pub fn compose(
        &self,
        mode: CompositionMode,
        variants: &[Variant],
        mesh: &ParameterMesh,
        datasets: &DatasetSet,
        scale: &ColorScale,
        bound: NormalizationBound,
    ) -> Result<Vec<Artifact>> {
        if variants.is_empty() {
            return Err(PlotError::Config(format!("no variants selected for {mode} figures")));
        }

        let renderer = SurfaceRenderer::new(mesh, scale, bound, self.policy);
        let surfaces = variants
            .iter()
            .map(|&variant| renderer.render(datasets.require(variant)?))
            .collect::<Result<Vec<_>>>()?;

        let figures = match mode {
            CompositionMode::PerVariant => self.per_variant(&surfaces, scale)?,
            CompositionMode::Combined => vec![self.combined(&surfaces, scale, bound)?],
        };

        let artifacts = self.write_all(figures)?;

        if mode == CompositionMode::Combined {
            if let Some(artifact) = artifacts.first() {
                self.preview(&artifact.path);
            }
        }
        Ok(artifacts)
    }

    fn per_variant(&self, surfaces: &[Surface], scale: &ColorScale) -> Result<Vec<PendingFigure>> {
        let size = (self.layout.panel_width, self.layout.panel_height);
        let mut figures = Vec::with_capacity(surfaces.len() + 1);

        for surface in surfaces {
            figures.push(PendingFigure {
                kind: ArtifactKind::Variant(surface.variant()),
                file_name: png_name(surface.variant().figure_stem()),
                bitmap: Bitmap::Opaque(rasterize(size, |root| surface.draw(root))?),
            });
        }

        // The color bar follows the mapping of the last surface drawn.
        if let Some(last) = surfaces.last() {
            let bar = ColorBar::new(scale, last.bound());
            let size = (self.layout.colorbar_width, self.layout.panel_height);
            figures.push(PendingFigure {
                kind: ArtifactKind::ColorBar,
                file_name: png_name(COLORBAR_STEM),
                bitmap: Bitmap::Opaque(rasterize(size, |root| bar.draw(root))?),
            });
        }

        Ok(figures)
    }

    fn combined(
        &self,
        surfaces: &[Surface],
        scale: &ColorScale,
        bound: NormalizationBound,
    ) -> Result<PendingFigure> {
        let layout = self.layout;
        let size = layout.combined_size(surfaces.len());
        let bar = ColorBar::new(scale, bound);

        let image = rasterize(size, |root| {
            let (panels, bar_area) =
                root.split_horizontally((size.0 - layout.combined_colorbar_width) as i32);

            let mut rest = panels;
            for (i, surface) in surfaces.iter().enumerate() {
                let (panel, tail) = rest.split_horizontally(layout.combined_panel_width as i32);
                surface.draw(&panel)?;
                rest = if i + 1 < surfaces.len() {
                    tail.split_horizontally(layout.panel_padding as i32).1
                } else {
                    tail
                };
            }

            bar.draw(&bar_area)
        })?;

        let bitmap = if self.transparent_combined {
            Bitmap::Transparent(knock_out_background(&image))
        } else {
            Bitmap::Opaque(image)
        };

        Ok(PendingFigure {
            kind: ArtifactKind::Combined,
            file_name: png_name(COMBINED_STEM),
            bitmap,
        })
    }

    fn write_all(&self, figures: Vec<PendingFigure>) -> Result<Vec<Artifact>> {
        fs::create_dir_all(&self.out_dir).map_err(|e| PlotError::Write {
            artifact: self.out_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        figures
            .into_iter()
            .map(|figure| {
                let path = self.out_dir.join(&figure.file_name);
                let saved = match &figure.bitmap {
                    Bitmap::Opaque(img) => img.save_with_format(&path, ImageFormat::Png),
                    Bitmap::Transparent(img) => img.save_with_format(&path, ImageFormat::Png),
                };
                saved.map_err(|e| PlotError::Write {
                    artifact: figure.file_name.clone(),
                    reason: e.to_string(),
                })?;

                tracing::info!("Wrote {}", path.display());
                Ok(Artifact {
                    kind: figure.kind,
                    path,
                })
            })
            .collect()
    }

    fn preview(&self, path: &Path) {
        let Some(command) = &self.preview_command else {
            return;
        };
        // Dropping the handle detaches the viewer: it is never waited on and
        // outlives the run. A missing viewer is not a rendering failure.
        match Command::new(command).arg(path).spawn() {
            Ok(child) => tracing::debug!(
                "Opened {} with {} (pid {})",
                path.display(),
                command,
                child.id()
            ),
            Err(e) => tracing::warn!("Preview with '{}' failed: {}", command, e),
        }
    }
}

fn png_name(stem: &str) -> String {
    format!("{stem}.png")
}

/// Rasterize into an in-memory RGB image on a white background.
fn rasterize<F>(size: (u32, u32), draw: F) -> Result<RgbImage>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    let (width, height) = size;
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| PlotError::Render("bitmap buffer does not match figure size".to_string()))
}

/// Make pure-white background pixels fully transparent.
fn knock_out_background(image: &RgbImage) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let alpha = if [r, g, b] == [255, 255, 255] { 0 } else { 255 };
        image::Rgba([r, g, b, alpha])
    })
}
