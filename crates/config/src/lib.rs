//! Configuration loading and schema for warble.
//!
//! Config file: `warble.toml`, searched in `./` then `~/.config/warble/`.
//! Supports `${ENV_VAR}` substitution in the raw file plus `WARBLE_*`
//! environment overrides on top of whatever was loaded.

pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{AuthConfig, BrowserConfig, ServerConfig, WarbleConfig},
};
