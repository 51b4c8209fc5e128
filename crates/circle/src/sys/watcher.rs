use crate::events::AppEvent;
use async_channel::Sender;
use fifths::config::{self, LayerPaths, get_config_path};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Editors tend to save in bursts of events; wait this long before reloading.
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// The config file plus every custom layer file it points at.
pub fn watched_files(config_path: &Path, layers: &LayerPaths) -> BTreeSet<PathBuf> {
    std::iter::once(config_path.to_path_buf())
        .chain(
            [&layers.keys, &layers.modes, &layers.frame]
                .into_iter()
                .flatten()
                .cloned(),
        )
        .collect()
}

fn is_relevant(event: &Event, files: &BTreeSet<PathBuf>) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| files.contains(p))
}

/// Directories to start and stop watching so exactly the parents of `files` are watched.
fn plan_watches(
    files: &BTreeSet<PathBuf>,
    watched_dirs: &BTreeSet<PathBuf>,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let wanted: BTreeSet<PathBuf> = files
        .iter()
        .filter_map(|f| f.parent())
        .map(Path::to_path_buf)
        .collect();
    let added = wanted.difference(watched_dirs).cloned().collect();
    let dropped = watched_dirs.difference(&wanted).cloned().collect();
    (added, dropped)
}

fn sync_watches(
    watcher: &mut RecommendedWatcher,
    files: &BTreeSet<PathBuf>,
    watched_dirs: &mut BTreeSet<PathBuf>,
) {
    let (added, dropped) = plan_watches(files, watched_dirs);
    for dir in dropped {
        if let Err(e) = watcher.unwatch(&dir) {
            log::warn!("Failed to unwatch {}: {}", dir.display(), e);
        }
        watched_dirs.remove(&dir);
    }
    for dir in added {
        match watcher.watch(&dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                watched_dirs.insert(dir);
            }
            Err(e) => log::error!("Failed to watch {}: {}", dir.display(), e),
        }
    }
}

/// Sends [`AppEvent::ConfigReload`] whenever the config file or a custom layer file changes.
pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };

    if let Some(dir) = config_path.parent()
        && let Err(e) = fs_err::create_dir_all(dir)
    {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    let mut files = watched_files(&config_path, &config::load_or_default().layers);
    let mut watched_dirs = BTreeSet::new();
    sync_watches(&mut watcher, &files, &mut watched_dirs);

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) if is_relevant(&event, &files) => {
                tokio::time::sleep(SETTLE_DELAY).await;
                while bridge_rx.try_recv().is_ok() {}

                // layer paths may have moved with the new config
                files = watched_files(&config_path, &config::load_or_default().layers);
                sync_watches(&mut watcher, &files, &mut watched_dirs);

                if tx.send(AppEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
