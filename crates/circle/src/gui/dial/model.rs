use super::UI_SCALE;
use fifths::angle::AngleRange;
use fifths::compose::WHEEL_RATIO;
use fifths::{
    ExportFormat, ExportJob, Input, InteractionController, LayerSources, LayerStack, Point,
    SvgLayer, Update,
};
use palette::Srgba;

/// Where the wheel sits inside the drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialGeometry {
    pub center: Point,
    pub diameter: f64,
    /// Side of the virtual canvas the wheel is fitted in; the label is sized against it.
    pub canvas_side: f64,
}

impl DialGeometry {
    pub fn for_area(width: f64, height: f64) -> Self {
        let diameter = width.min(height).max(0.0) * UI_SCALE;
        Self {
            center: Point::new(width / 2.0, height / 2.0),
            diameter,
            canvas_side: diameter / WHEEL_RATIO,
        }
    }
}

/// Bounds for a ring slider: the ring's active range, stretched to cover a
/// value left outside it by unlinking until the ring is next set.
pub fn slider_range(range: AngleRange, value: i32) -> AngleRange {
    range.union(&AngleRange::new(value, value))
}

/// Everything the window draws from. Layers are rasterized lazily and cached per size.
pub struct DialState {
    pub controller: InteractionController,
    pub layers: LayerStack<SvgLayer>,
    pub sources: LayerSources,
    pub accent: Srgba<f64>,
}

impl DialState {
    pub fn new(sources: LayerSources, accent: Srgba<f64>) -> Self {
        Self {
            controller: InteractionController::new(),
            layers: sources.instantiate(),
            sources,
            accent,
        }
    }

    pub fn handle(&mut self, input: Input) -> Update {
        self.controller.handle(input)
    }

    /// Swaps in new artwork and label color; ring angles and link state are kept.
    pub fn reload(&mut self, sources: LayerSources, accent: Srgba<f64>) {
        if sources != self.sources {
            self.layers = sources.instantiate();
            self.sources = sources;
        }
        self.accent = accent;
    }

    pub fn export_job(&self, format: ExportFormat) -> ExportJob {
        self.controller.export_job(self.sources.clone(), format)
    }
}
