pub mod export;
pub mod runtime;
pub mod watcher;
