pub mod config;
pub mod pipeline;
pub mod scan;
pub mod upload;
pub mod watcher;
