pub mod model;
pub mod view;

pub use model::{DialGeometry, DialState, slider_range};
pub use view::draw;

/// Share of the drawing area's shorter side the wheel occupies on screen.
pub const UI_SCALE: f64 = 0.90;
/// Ring slider tick marks, one per sector.
pub const MARK_STEP: f64 = 30.0;
