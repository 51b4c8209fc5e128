use crate::events::AppEvent;
use async_channel::Sender;
use fifths::{ExportFormat, ExportJob, Exporter};
use std::path::PathBuf;
use std::thread;

/// Picks the format from the chosen file name, falling back to `hint` and
/// appending its extension when the name has none we know.
pub fn resolve_target(mut path: PathBuf, hint: ExportFormat) -> (PathBuf, ExportFormat) {
    match ExportFormat::from_path(&path) {
        Ok(format) => (path, format),
        Err(_) => {
            let name = path
                .file_name()
                .map(|n| format!("{}.{}", n.to_string_lossy(), hint.extension()));
            if let Some(name) = name {
                path.set_file_name(name);
            }
            (path, hint)
        }
    }
}

/// Renders and writes `job` on a worker thread, then reports back on `tx`.
///
/// The file is only written once the whole image is encoded.
pub fn spawn_export(job: ExportJob, exporter: Exporter, path: PathBuf, tx: Sender<AppEvent>) {
    thread::spawn(move || {
        let result = job
            .run(&exporter)
            .map_err(|e| e.to_string())
            .and_then(|bytes| fs_err::write(&path, bytes).map_err(|e| e.to_string()))
            .map(|_| path);

        if tx.send_blocking(AppEvent::ExportFinished(result)).is_err() {
            log::error!("Export finished after the window closed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_decides_format() {
        let (path, format) = resolve_target(PathBuf::from("/tmp/C_Major.PNG"), ExportFormat::Pdf);
        assert_eq!(path, PathBuf::from("/tmp/C_Major.PNG"));
        assert_eq!(format, ExportFormat::Png);
    }

    #[test]
    fn test_missing_extension_uses_hint() {
        let (path, format) = resolve_target(PathBuf::from("/tmp/wheel"), ExportFormat::Pdf);
        assert_eq!(path, PathBuf::from("/tmp/wheel.pdf"));
        assert_eq!(format, ExportFormat::Pdf);

        let (path, _) = resolve_target(PathBuf::from("/tmp/A.Minor"), ExportFormat::Png);
        assert_eq!(path, PathBuf::from("/tmp/A.Minor.png"));
    }
}
