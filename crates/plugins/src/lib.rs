//! Sandboxed WebAssembly plugins.
//!
//! Plugins are `.wasm` (or `.wat`) modules dropped into the plugin directory
//! (`~/.config/murmur/plugins` by default). They are instantiated once at
//! startup into a [`PluginRegistry`] and live until the process exits. A
//! module gets no host imports, a bounded memory and a fuel budget for its
//! start function, so a plugin can neither touch the system nor hang startup.

pub mod error;
pub mod registry;
pub mod sandbox;

pub use {
    error::{Error, Result},
    registry::{PluginInstance, PluginRegistry},
};
