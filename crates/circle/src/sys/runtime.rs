use crate::events::AppEvent;
use crate::sys::watcher;
use async_channel::Sender;
use std::thread;
use tokio::runtime::Runtime;

/// Runs the file watcher on its own Tokio runtime, off the GTK main loop.
pub fn start_background_services(tx: Sender<AppEvent>) {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create Tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(watcher::run_async_watcher(tx));
        log::warn!("Config watcher stopped");
    });
}
