use crate::angle::{AngleModel, Angles, Ring};
use crate::export::{ExportFormat, ExportJob};
use crate::key::{KeyLabel, resolve_key};
use crate::layer::LayerSources;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    SetOuter(f64),
    SetInner(f64),
    SetLinked(bool),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Update {
    pub should_redraw: bool,
    pub label_changed: bool,
}

impl Update {
    pub fn new(should_redraw: bool, label_changed: bool) -> Self {
        Self {
            should_redraw,
            label_changed,
        }
    }
}

/// Feeds user input into the [`AngleModel`] and keeps the key label in sync.
#[derive(Debug, Clone)]
pub struct InteractionController {
    model: AngleModel,
    label: KeyLabel,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        let model = AngleModel::new();
        let angles = model.angles();
        Self {
            model,
            label: resolve_key(angles.outer, angles.inner),
        }
    }

    pub fn handle(&mut self, input: Input) -> Update {
        let before = self.model.clone();
        match input {
            Input::SetOuter(raw) => {
                self.model.set_angle(Ring::Outer, raw);
            }
            Input::SetInner(raw) => {
                self.model.set_angle(Ring::Inner, raw);
            }
            Input::SetLinked(linked) => self.model.set_linked(linked),
        }

        let angles = self.model.angles();
        let label = resolve_key(angles.outer, angles.inner);
        let label_changed = label != self.label;
        if label_changed {
            log::debug!("Key changed to {:?} at {}", label.as_str(), angles);
            self.label = label;
        }

        Update::new(self.model != before, label_changed)
    }

    pub fn model(&self) -> &AngleModel {
        &self.model
    }

    pub fn angles(&self) -> Angles {
        self.model.angles()
    }

    pub fn label(&self) -> &KeyLabel {
        &self.label
    }

    /// The angles and label an export needs, detached from further input.
    pub fn snapshot(&self) -> (Angles, KeyLabel) {
        (self.angles(), self.label.clone())
    }

    pub fn export_job(&self, sources: LayerSources, format: ExportFormat) -> ExportJob {
        let (angles, label) = self.snapshot();
        ExportJob {
            sources,
            angles,
            label,
            format,
        }
    }
}
