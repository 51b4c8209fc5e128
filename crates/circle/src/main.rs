use circle::gui::app::AppModel;
use circle::gui::dial::DialState;
use circle::sys::runtime;
use fifths::LayerSources;
use fifths::config;
use relm4::prelude::*;

fn main() {
    env_logger::init();

    let config = config::load_or_default();
    let sources = LayerSources::from_paths(&config.layers).unwrap_or_else(|e| {
        log::error!("Failed to load layers, using built-in wheel: {}", e);
        LayerSources::builtin()
    });
    let state = DialState::new(sources, config.label.color.to_srgba());

    let (tx, rx) = async_channel::bounded(32);

    // config and layer file watcher
    runtime::start_background_services(tx.clone());

    let app = RelmApp::new("org.fifths.circle");

    app.run::<AppModel>((state, tx.clone(), rx));
}
