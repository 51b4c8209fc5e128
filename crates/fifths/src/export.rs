use crate::angle::Angles;
use crate::compose::{WHEEL_RATIO, compose, draw_label};
use crate::geometry::{PageGeometry, Point};
use crate::key::KeyLabel;
use crate::layer::{LayerSources, LayerStack, RenderError, RenderSource};
use cairo::{Context, Format, ImageSurface, PdfSurface};
use palette::Srgba;
use std::path::Path;
use strum::{Display as StrumDisplay, EnumIter, EnumString};
use thiserror::Error;

/// Side of the square every export is rendered at, in pixels.
pub const RASTER_SIDE: i32 = 2048;
pub const DEFAULT_FILE_STEM: &str = "circle";
pub const NAME_SEPARATOR: &str = "_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Result<Self, ExportError> {
        name.trim()
            .parse()
            .map_err(|_| ExportError::UnsupportedFormat(name.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_name(ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Pdf => "PDF Document",
            Self::Png => "PNG Image",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),
    #[error("Encoding error: {0}")]
    Encode(#[from] cairo::IoError),
    #[error("Document stream error: {0}")]
    Stream(String),
}

/// `C Major` becomes `C_Major.png`; an empty label falls back to `circle.png`.
pub fn suggested_file_name(label: &str, format: ExportFormat) -> String {
    let label = label.trim();
    let stem = if label.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        label.replace(' ', NAME_SEPARATOR)
    };
    format!("{}.{}", stem, format.extension())
}

/// Renders the wheel plus its label off screen and encodes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exporter {
    pub accent: Srgba<f64>,
    pub page: PageGeometry,
    pub side: i32,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Srgba::new(0x70 as f64 / 255.0, 0x1e as f64 / 255.0, 0x22 as f64 / 255.0, 1.0))
    }
}

impl Exporter {
    pub fn new(accent: Srgba<f64>) -> Self {
        Self {
            accent,
            page: PageGeometry::A4,
            side: RASTER_SIDE,
        }
    }

    /// The flattened wheel: white background, layers, then the label.
    pub fn render_wheel<S: RenderSource>(
        &self,
        layers: &LayerStack<S>,
        angles: Angles,
        label: &KeyLabel,
    ) -> Result<ImageSurface, ExportError> {
        let surface = ImageSurface::create(Format::ARgb32, self.side, self.side)?;
        {
            let side = self.side as f64;
            let center = Point::new(side / 2.0, side / 2.0);
            let cr = Context::new(&surface)?;
            cr.set_source_rgb(1.0, 1.0, 1.0);
            cr.paint()?;
            compose(&cr, layers, angles, center, side * WHEEL_RATIO)?;
            draw_label(&cr, label, center, side, self.accent)?;
        }
        surface.flush();
        Ok(surface)
    }

    pub fn export_raster<S: RenderSource>(
        &self,
        layers: &LayerStack<S>,
        angles: Angles,
        label: &KeyLabel,
    ) -> Result<Vec<u8>, ExportError> {
        let surface = self.render_wheel(layers, angles, label)?;
        let mut bytes = Vec::new();
        surface.write_to_png(&mut bytes)?;
        Ok(bytes)
    }

    /// Single page with the flattened wheel scaled to 90% of the page width and centered.
    pub fn export_document<S: RenderSource>(
        &self,
        layers: &LayerStack<S>,
        angles: Angles,
        label: &KeyLabel,
    ) -> Result<Vec<u8>, ExportError> {
        let wheel = self.render_wheel(layers, angles, label)?;
        let placement = self.page.center_square(self.side as f64, WHEEL_RATIO);

        let surface = PdfSurface::for_stream(self.page.width, self.page.height, Vec::<u8>::new())?;
        {
            let cr = Context::new(&surface)?;
            cr.translate(placement.origin.x, placement.origin.y);
            cr.scale(placement.scale, placement.scale);
            cr.set_source_surface(&wheel, 0.0, 0.0)?;
            cr.paint()?;
            cr.show_page()?;
        }

        let stream = surface
            .finish_output_stream()
            .map_err(|e| ExportError::Stream(e.error.to_string()))?;
        stream
            .downcast::<Vec<u8>>()
            .map(|bytes| *bytes)
            .map_err(|_| ExportError::Stream("unexpected output stream".to_string()))
    }

    pub fn export<S: RenderSource>(
        &self,
        format: ExportFormat,
        layers: &LayerStack<S>,
        angles: Angles,
        label: &KeyLabel,
    ) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::Png => self.export_raster(layers, angles, label),
            ExportFormat::Pdf => self.export_document(layers, angles, label),
        }
    }
}

/// Everything one export needs, owned so it can run away from the UI thread.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub sources: LayerSources,
    pub angles: Angles,
    pub label: KeyLabel,
    pub format: ExportFormat,
}

impl ExportJob {
    pub fn file_name(&self) -> String {
        suggested_file_name(&self.label, self.format)
    }

    pub fn run(&self, exporter: &Exporter) -> Result<Vec<u8>, ExportError> {
        log::info!(
            "Exporting {} at {} as {}",
            self.label,
            self.angles,
            self.format
        );
        let layers = self.sources.instantiate();
        exporter.export(self.format, &layers, self.angles, &self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tests::{pixel, red_marker_stack};

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn small_exporter() -> Exporter {
        Exporter {
            side: 256,
            ..Exporter::default()
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_name("png").unwrap(), ExportFormat::Png);
        assert_eq!(ExportFormat::from_name("PDF").unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            ExportFormat::from_name("gif"),
            Err(ExportError::UnsupportedFormat(f)) if f == "gif"
        ));
        assert_eq!(
            ExportFormat::from_path(Path::new("/tmp/C_Major.PNG")).unwrap(),
            ExportFormat::Png
        );
        assert!(ExportFormat::from_path(Path::new("/tmp/wheel")).is_err());
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(
            suggested_file_name("C Major", ExportFormat::Png),
            "C_Major.png"
        );
        assert_eq!(
            suggested_file_name("F# Mixolydian", ExportFormat::Pdf),
            "F#_Mixolydian.pdf"
        );
        assert_eq!(suggested_file_name("", ExportFormat::Pdf), "circle.pdf");
        assert_eq!(suggested_file_name("  ", ExportFormat::Png), "circle.png");
    }

    #[test]
    fn test_wheel_fills_ninety_percent_on_white() {
        let exporter = small_exporter();
        let mut surface = exporter
            .render_wheel(&red_marker_stack(), Angles::new(0, 0), &KeyLabel::default())
            .unwrap();
        assert_eq!(surface.width(), 256);
        assert_eq!(pixel(&mut surface, 0, 0), (255, 255, 255));
        assert_eq!(pixel(&mut surface, 255, 255), (255, 255, 255));
        // marker spans the top tenth of the 230.4px wheel square starting at 12.8
        assert_eq!(pixel(&mut surface, 128, 20), (255, 0, 0));
        assert_eq!(pixel(&mut surface, 128, 6), (255, 255, 255));
    }

    #[test]
    fn test_export_raster_is_png_and_deterministic() {
        let exporter = small_exporter();
        let stack = red_marker_stack();
        let label = KeyLabel::new("D Dorian");
        let first = exporter
            .export_raster(&stack, Angles::new(60, 60), &label)
            .unwrap();
        let second = exporter
            .export_raster(&stack, Angles::new(60, 60), &label)
            .unwrap();
        assert!(first.starts_with(PNG_SIGNATURE));
        assert_eq!(first, second);
    }

    #[test]
    fn test_export_raster_default_side() {
        let bytes = Exporter::default()
            .export_raster(&red_marker_stack(), Angles::new(0, 0), &KeyLabel::new("C Major"))
            .unwrap();
        let surface = ImageSurface::create_from_png(&mut bytes.as_slice()).unwrap();
        assert_eq!((surface.width(), surface.height()), (2048, 2048));
    }

    #[test]
    fn test_label_changes_the_image() {
        let exporter = small_exporter();
        let stack = red_marker_stack();
        let angles = Angles::new(0, 210);
        let bare = exporter
            .export_raster(&stack, angles, &KeyLabel::default())
            .unwrap();
        let labelled = exporter
            .export_raster(&stack, angles, &KeyLabel::new("C Major"))
            .unwrap();
        assert_ne!(bare, labelled);
    }

    #[test]
    fn test_export_document_is_pdf() {
        let bytes = small_exporter()
            .export_document(&red_marker_stack(), Angles::new(0, 210), &KeyLabel::default())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_dispatches_on_format() {
        let exporter = small_exporter();
        let stack = red_marker_stack();
        let label = KeyLabel::new("A Minor");
        let png = exporter
            .export(ExportFormat::Png, &stack, Angles::new(0, 90), &label)
            .unwrap();
        let pdf = exporter
            .export(ExportFormat::Pdf, &stack, Angles::new(0, 90), &label)
            .unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_job_renders_builtin_layers() {
        let exporter = small_exporter();
        let job = |format| ExportJob {
            sources: LayerSources::builtin(),
            angles: Angles::new(30, 60),
            label: KeyLabel::new("G Dorian"),
            format,
        };

        let png = job(ExportFormat::Png).run(&exporter).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
        assert_eq!(png, job(ExportFormat::Png).run(&exporter).unwrap());

        let pdf = job(ExportFormat::Pdf).run(&exporter).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_job_rotation_changes_the_image() {
        let exporter = small_exporter();
        let run = |angles| {
            ExportJob {
                sources: LayerSources::builtin(),
                angles,
                label: KeyLabel::default(),
                format: ExportFormat::Png,
            }
            .run(&exporter)
            .unwrap()
        };
        assert_ne!(run(Angles::new(0, 0)), run(Angles::new(30, 0)));
    }

    #[test]
    fn test_job_file_name_uses_label() {
        let job = ExportJob {
            sources: LayerSources::builtin(),
            angles: Angles::new(0, 0),
            label: KeyLabel::new("C Major"),
            format: ExportFormat::Pdf,
        };
        assert_eq!(job.file_name(), "C_Major.pdf");
    }
}
