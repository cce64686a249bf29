pub mod cashaddr;
mod custom_serde;
pub mod protocol;
pub mod service;
pub mod types;
pub mod watcher;
