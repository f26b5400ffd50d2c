//! Configuration loading and env substitution.
//!
//! Config files: `murmur.toml`, `murmur.yaml`, or `murmur.json`
//! Searched in `./` then `~/.config/murmur/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in all
//! string values.

mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{cache_dir, config_dir, data_dir, discover_and_load, download_dir, load_config},
    schema::{GatewayConfig, IdentifyConfig, KeysConfig, MurmurConfig, ThemeConfig},
};
