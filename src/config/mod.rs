//! Configuration for the facade layout and the inspection CLI.

pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::{Config, Layout, Paths, WatchConfig};
