//! Engine and store configuration shared by every plugin instance.

use wasmtime::{Config, Engine, Linker, StoreLimits, StoreLimitsBuilder};

use crate::{Error, Result};

/// Fuel granted to each instance. Only the start function runs during
/// loading, so this caps how long a plugin may block startup.
pub const FUEL_PER_INSTANCE: u64 = 10_000_000;

/// Upper bound on a single instance's linear memory.
pub const MAX_MEMORY_BYTES: usize = 64 * 1024 * 1024;

/// Per-store host state.
pub struct SandboxState {
    pub(crate) limits: StoreLimits,
}

impl Default for SandboxState {
    fn default() -> Self {
        Self {
            limits: StoreLimitsBuilder::new()
                .memory_size(MAX_MEMORY_BYTES)
                .instances(1)
                .build(),
        }
    }
}

/// Build an engine with fuel metering enabled.
pub fn engine() -> Result<Engine> {
    let mut config = Config::new();
    config.consume_fuel(true);
    Engine::new(&config).map_err(Error::engine)
}

/// A linker that exposes no host functions. Any module that imports
/// something fails to instantiate.
pub fn linker(engine: &Engine) -> Linker<SandboxState> {
    Linker::new(engine)
}
