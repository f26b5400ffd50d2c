//! Plugin discovery and instantiation.

use std::path::{Path, PathBuf};

use {
    tracing::{debug, info, warn},
    wasmtime::{Engine, Instance, Linker, Module, Store},
};

use crate::{
    Error, Result,
    sandbox::{self, FUEL_PER_INSTANCE, SandboxState},
};

/// A successfully instantiated plugin.
pub struct PluginInstance {
    name: String,
    path: PathBuf,
    module: Module,
    #[allow(dead_code)] // Held for the process lifetime; no invocation API yet
    store: Store<SandboxState>,
    #[allow(dead_code)]
    instance: Instance,
}

impl PluginInstance {
    fn instantiate(engine: &Engine, linker: &Linker<SandboxState>, path: &Path) -> Result<Self> {
        let module = Module::from_file(engine, path).map_err(|e| Error::instantiate(path, e))?;

        let mut store = Store::new(engine, SandboxState::default());
        store.limiter(|state| &mut state.limits);
        store
            .set_fuel(FUEL_PER_INSTANCE)
            .map_err(|e| Error::instantiate(path, e))?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| Error::instantiate(path, e))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            path: path.to_path_buf(),
            module,
            store,
            instance,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the functions, memories and globals the module exports.
    pub fn export_names(&self) -> Vec<String> {
        self.module
            .exports()
            .map(|export| export.name().to_owned())
            .collect()
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Process-wide set of loaded plugins.
///
/// Built exactly once at startup with [`PluginRegistry::load`] and handed to
/// the app as a context object. There is no reload or unload.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginInstance>,
}

impl PluginRegistry {
    /// A registry with no plugins, for runs without a plugin directory.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Instantiate every entry of `dir`, in file-name order.
    ///
    /// A missing directory yields an empty registry. Entries that fail to
    /// instantiate are logged and skipped. Only a directory that exists but
    /// cannot be listed is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "plugin directory does not exist");
                return Ok(Self::empty());
            },
            Err(e) => return Err(Error::read_dir(dir, e)),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "failed to read plugin entry");
                    None
                },
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Ok(Self::empty());
        }

        let engine = sandbox::engine()?;
        let linker = sandbox::linker(&engine);
        let mut plugins = Vec::with_capacity(paths.len());

        for path in paths {
            match PluginInstance::instantiate(&engine, &linker, &path) {
                Ok(plugin) => {
                    info!(
                        plugin = plugin.name(),
                        exports = plugin.export_names().len(),
                        "loaded plugin"
                    );
                    plugins.push(plugin);
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load plugin");
                },
            }
        }

        Ok(Self { plugins })
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginInstance> {
        self.plugins.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginInstance::name).collect()
    }
}
