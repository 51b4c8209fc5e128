use crate::events::AppEvent;
use crate::gui::dial::{self, DialGeometry, DialState, MARK_STEP, slider_range};
use crate::gui::theme::{self, ThemeColors};
use crate::sys::export::{self, spawn_export};
use fifths::angle::AngleRange;
use fifths::config;
use fifths::export::suggested_file_name;
use fifths::{ExportFormat, Exporter, Input, LayerSources, Ring};
use gtk::glib;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

pub struct AppModel {
    pub state: Rc<RefCell<DialState>>,
    pub status: String,
    pub event_tx: async_channel::Sender<AppEvent>,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    /// Ring sliders with their value-changed handlers, blocked while the model writes back.
    pub scales: Vec<(Ring, gtk::Scale, glib::SignalHandlerId)>,
    #[allow(deprecated)]
    pub chooser: Option<gtk::FileChooserNative>,
}

#[derive(Debug)]
pub enum AppMsg {
    SetOuter(f64),
    SetInner(f64),
    SetLinked(bool),
    Export,
    ExportTo(PathBuf, ExportFormat),
    ExportFinished(Result<PathBuf, String>),
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
            AppEvent::ExportFinished(result) => AppMsg::ExportFinished(result),
        }
    }
}

fn sync_scale(
    scale: &gtk::Scale,
    handler: &glib::SignalHandlerId,
    range: AngleRange,
    value: i32,
) {
    scale.block_signal(handler);
    let range = slider_range(range, value);
    let adjustment = scale.adjustment();
    let (lower, upper) = (range.min as f64, range.max as f64);
    if adjustment.lower() != lower || adjustment.upper() != upper {
        scale.set_range(lower, upper);
        scale.clear_marks();
        let mut mark = lower;
        while mark <= upper {
            scale.add_mark(mark, gtk::PositionType::Bottom, None);
            mark += MARK_STEP;
        }
    }
    if scale.value() != value as f64 {
        scale.set_value(value as f64);
    }
    scale.unblock_signal(handler);
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        DialState,
        async_channel::Sender<AppEvent>,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Circle of Fifths"),
            set_default_size: (720, 820),
            add_css_class: "circle-window",

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,

                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                },

                gtk::Grid {
                    add_css_class: "circle-controls",
                    set_row_spacing: 6,
                    set_column_spacing: 12,

                    attach[0, 0, 1, 1] = &gtk::Label {
                        set_label: "Key",
                        set_xalign: 0.0,
                    },
                    #[name = "outer_scale"]
                    attach[1, 0, 2, 1] = &gtk::Scale {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_hexpand: true,
                        set_digits: 0,
                        set_draw_value: true,
                    },

                    attach[0, 1, 1, 1] = &gtk::Label {
                        set_label: "Mode",
                        set_xalign: 0.0,
                    },
                    #[name = "inner_scale"]
                    attach[1, 1, 2, 1] = &gtk::Scale {
                        set_orientation: gtk::Orientation::Horizontal,
                        set_hexpand: true,
                        set_digits: 0,
                        set_draw_value: true,
                    },

                    attach[0, 2, 1, 1] = &gtk::CheckButton {
                        set_label: Some("Link rings"),
                        connect_toggled[sender] => move |button| {
                            sender.input(AppMsg::SetLinked(button.is_active()));
                        },
                    },
                    attach[1, 2, 1, 1] = &gtk::Label {
                        add_css_class: "circle-status",
                        set_hexpand: true,
                        set_xalign: 0.0,
                        set_ellipsize: gtk::pango::EllipsizeMode::Middle,
                        #[watch]
                        set_label: &model.status,
                    },
                    attach[2, 2, 1, 1] = &gtk::Button {
                        set_label: "Save…",
                        connect_clicked[sender] => move |_| {
                            sender.input(AppMsg::Export);
                        },
                    },
                },
            },
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (state, event_tx, rx) = init;

        theme::load_css();

        let model = AppModel {
            state: Rc::new(RefCell::new(state)),
            status: String::new(),
            event_tx,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            scales: Vec::new(),
            chooser: None,
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        for (ring, scale) in [
            (Ring::Outer, &widgets.outer_scale),
            (Ring::Inner, &widgets.inner_scale),
        ] {
            let sender = sender.clone();
            let handler = scale.connect_value_changed(move |scale| {
                let msg = match ring {
                    Ring::Outer => AppMsg::SetOuter(scale.value()),
                    Ring::Inner => AppMsg::SetInner(scale.value()),
                };
                sender.input(msg);
            });
            model.scales.push((ring, scale.clone(), handler));
        }
        model.sync_controls();

        let state_draw = model.state.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let geometry = DialGeometry::for_area(width as f64, height as f64);
                if let Err(e) = dial::draw(cr, &state_draw.borrow(), &geometry, &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::SetOuter(raw) => self.apply(Input::SetOuter(raw)),
            AppMsg::SetInner(raw) => self.apply(Input::SetInner(raw)),
            AppMsg::SetLinked(linked) => self.apply(Input::SetLinked(linked)),
            AppMsg::Export => self.open_chooser(sender),
            AppMsg::ExportTo(path, hint) => {
                let (path, format) = export::resolve_target(path, hint);
                let (job, accent) = {
                    let state = self.state.borrow();
                    (state.export_job(format), state.accent)
                };
                self.status = format!("Saving {}…", path.display());
                spawn_export(job, Exporter::new(accent), path, self.event_tx.clone());
            }
            AppMsg::ExportFinished(Ok(path)) => {
                log::info!("Saved {}", path.display());
                self.status = format!("Saved {}", path.display());
            }
            AppMsg::ExportFinished(Err(e)) => {
                log::error!("Export failed: {}", e);
                self.status = format!("Export failed: {}", e);
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    let mut state = self.state.borrow_mut();
                    let sources = LayerSources::from_paths(&new_config.layers)
                        .unwrap_or_else(|e| {
                            log::error!("Failed to load layers, keeping current ones: {}", e);
                            state.sources.clone()
                        });
                    state.reload(sources, new_config.label.color.to_srgba());
                    drop(state);
                    self.drawing_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    fn apply(&mut self, input: Input) {
        let update = self.state.borrow_mut().handle(input);
        if update.should_redraw {
            self.sync_controls();
            self.drawing_area.queue_draw();
        }
    }

    /// Pushes the model's snapped angles and ranges back into the sliders.
    fn sync_controls(&self) {
        let state = self.state.borrow();
        let model = state.controller.model();
        for (ring, scale, handler) in &self.scales {
            sync_scale(scale, handler, model.range(*ring), model.angle(*ring));
        }
    }

    #[allow(deprecated)]
    fn open_chooser(&mut self, sender: ComponentSender<Self>) {
        let chooser = gtk::FileChooserNative::new(
            Some("Save Circle"),
            Some(&self.root),
            gtk::FileChooserAction::Save,
            Some("Save"),
            Some("Cancel"),
        );

        for format in [ExportFormat::Pdf, ExportFormat::Png] {
            let filter = gtk::FileFilter::new();
            filter.set_name(Some(format.description()));
            filter.add_pattern(&format!("*.{}", format.extension()));
            chooser.add_filter(&filter);
        }

        let label = self.state.borrow().controller.label().clone();
        chooser.set_current_name(&suggested_file_name(&label, ExportFormat::Pdf));

        chooser.connect_response(move |dialog, response| {
            if response == gtk::ResponseType::Accept
                && let Some(path) = dialog.file().and_then(|f| f.path())
            {
                let hint = dialog
                    .filter()
                    .and_then(|f| f.name())
                    .filter(|name| name.as_str() == ExportFormat::Png.description())
                    .map(|_| ExportFormat::Png)
                    .unwrap_or(ExportFormat::Pdf);
                sender.input(AppMsg::ExportTo(path, hint));
            }
            dialog.destroy();
        });

        chooser.show();
        self.chooser = Some(chooser);
    }
}
