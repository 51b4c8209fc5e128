pub mod macros;

pub mod angle;
pub mod compose;
pub mod config;
pub mod controller;
pub mod export;
pub mod geometry;
pub mod key;
pub mod layer;
pub mod server;

pub use angle::{AngleModel, AngleRange, Angles, Ring};
pub use compose::{compose, draw_label};
pub use controller::{Input, InteractionController, Update};
pub use export::{ExportError, ExportFormat, ExportJob, Exporter};
pub use geometry::{PageGeometry, Point};
pub use key::{Key, KeyLabel, Mode, resolve, resolve_key};
pub use layer::{LayerSlot, LayerSources, LayerStack, RenderError, RenderSource, SvgLayer};
