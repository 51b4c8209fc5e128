use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum AppEvent {
    ConfigReload,
    ExportFinished(Result<PathBuf, String>),
}
