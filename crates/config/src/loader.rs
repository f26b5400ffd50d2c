use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env_with, schema::MurmurConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["murmur.toml", "murmur.yaml", "murmur.yml", "murmur.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<MurmurConfig> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_config`], resolving `${VAR}` through `lookup`.
fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<MurmurConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_config(&substitute_env_with(&raw, lookup), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./murmur.{toml,yaml,yml,json}` (project-local)
/// 2. `<config dir>/murmur.{toml,yaml,yml,json}` where `<config dir>` is
///    `config_dir_override` or `~/.config/murmur/`
///
/// Returns `MurmurConfig::default()` if no config file is found. A file that
/// exists but cannot be read or parsed is an error.
pub fn discover_and_load(config_dir_override: Option<&Path>) -> anyhow::Result<MurmurConfig> {
    let Some(path) = find_config_file(config_dir_override) else {
        debug!("no config file found, using defaults");
        return Ok(MurmurConfig::default());
    };

    debug!(path = %path.display(), "loading config");
    load_config(&path)
}

/// Find the first config file in standard locations.
fn find_config_file(config_dir_override: Option<&Path>) -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global
    let dir = config_dir_override
        .map(Path::to_path_buf)
        .or_else(config_dir)?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "murmur")
}

/// Returns the user-global config directory (`~/.config/murmur/`).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory (logs live here).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.data_dir().to_path_buf())
}

/// Returns the user cache directory used for attachments opened for viewing.
pub fn cache_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.cache_dir().to_path_buf())
}

/// Returns the user's download directory, if the platform defines one.
pub fn download_dir() -> Option<PathBuf> {
    directories::UserDirs::new().and_then(|d| d.download_dir().map(Path::to_path_buf))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<MurmurConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = discover_and_load(Some(tmp.path())).unwrap();
        assert_eq!(cfg.messages_limit, 50);
    }

    #[test]
    fn loads_toml_from_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("murmur.toml"),
            r##"
messages_limit = 25
mouse = false

[gateway]
url = "wss://chat.example.com/gateway"
token = "Bot secret"

[theme]
emote_color = "#ff00ff"

[keys]
select_previous_message = ["Ctrl+K"]
"##,
        )
        .unwrap();

        let cfg = discover_and_load(Some(tmp.path())).unwrap();
        assert_eq!(cfg.messages_limit, 25);
        assert!(!cfg.mouse);
        assert_eq!(cfg.gateway.url, "wss://chat.example.com/gateway");
        assert!(cfg.gateway.is_bot());
        assert_eq!(cfg.theme.emote_color, "#ff00ff");
        assert_eq!(cfg.keys.select_previous_message, vec!["Ctrl+K"]);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.keys.select_next_message, vec!["Down", "j"]);
    }

    #[test]
    fn loads_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("murmur.json");
        std::fs::write(&path, r#"{"gateway": {"token": "abc"}}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        let token = cfg.gateway.token.unwrap();
        assert_eq!(token.expose_secret(), "abc");
    }

    #[test]
    fn token_placeholder_resolves_before_parsing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("murmur.yaml");
        std::fs::write(
            &path,
            "gateway:\n  token: \"Bot ${MURMUR_TOKEN}\"\nmessages_limit: ${MURMUR_LIMIT:-20}\n",
        )
        .unwrap();

        let cfg = load_config_with(&path, |name| {
            (name == "MURMUR_TOKEN").then(|| "abc".to_string())
        })
        .unwrap();
        assert_eq!(cfg.gateway.token.as_ref().unwrap().expose_secret(), "Bot abc");
        assert!(cfg.gateway.is_bot());
        assert_eq!(cfg.messages_limit, 20);
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("murmur.toml"), "messages_limit = [").unwrap();
        assert!(discover_and_load(Some(tmp.path())).is_err());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("murmur.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(load_config(&path).is_err());
    }
}
