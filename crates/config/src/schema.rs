/// Config schema types (gateway, identify, theme, keys).
use std::path::PathBuf;

use {
    murmur_protocol::{BOT_TOKEN_PREFIX, DEFAULT_MESSAGES_LIMIT, IdentifyProperties},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MurmurConfig {
    pub gateway: GatewayConfig,
    pub identify: IdentifyConfig,
    /// Number of messages fetched when a channel is opened. Defaults to 50.
    pub messages_limit: u32,
    pub mouse: bool,
    /// Where "Download Attachment" writes files. Falls back to the user's
    /// download directory.
    pub attachment_downloads_dir: Option<PathBuf>,
    /// Directory scanned for WebAssembly plugins at startup. Falls back to
    /// `<config dir>/plugins`.
    pub plugins_dir: Option<PathBuf>,
    pub theme: ThemeConfig,
    pub keys: KeysConfig,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            identify: IdentifyConfig::default(),
            messages_limit: DEFAULT_MESSAGES_LIMIT,
            mouse: true,
            attachment_downloads_dir: None,
            plugins_dir: None,
            theme: ThemeConfig::default(),
            keys: KeysConfig::default(),
        }
    }
}

impl MurmurConfig {
    /// Resolved plugin directory, if one can be determined.
    pub fn plugins_dir(&self) -> Option<PathBuf> {
        self.plugins_dir
            .clone()
            .or_else(|| crate::config_dir().map(|dir| dir.join("plugins")))
    }

    /// Resolved attachment download directory.
    pub fn attachment_downloads_dir(&self) -> PathBuf {
        self.attachment_downloads_dir
            .clone()
            .or_else(crate::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Remote gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// WebSocket URL of the gateway.
    pub url: String,
    /// Authentication token. Prefix with `Bot ` for bot accounts.
    pub token: Option<Secret<String>>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "wss://localhost:9443/gateway".into(),
            token: None,
        }
    }
}

impl GatewayConfig {
    /// Whether the configured token belongs to a bot account.
    pub fn is_bot(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|t| t.expose_secret().starts_with(BOT_TOKEN_PREFIX))
    }
}

/// Client properties reported to the gateway during identify.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentifyConfig {
    pub user_agent: String,
    pub browser: String,
    pub browser_version: String,
    pub os: String,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("murmur/{}", env!("CARGO_PKG_VERSION")),
            browser: "murmur".into(),
            browser_version: env!("CARGO_PKG_VERSION").into(),
            os: std::env::consts::OS.into(),
        }
    }
}

impl IdentifyConfig {
    pub fn properties(&self) -> IdentifyProperties {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
        IdentifyProperties {
            browser: non_empty(&self.browser),
            browser_user_agent: non_empty(&self.user_agent),
            browser_version: non_empty(&self.browser_version),
            os: non_empty(&self.os),
        }
    }
}

/// Visual settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub borders: bool,
    /// Color used for custom emote references in message content.
    pub emote_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: None,
            foreground: None,
            borders: true,
            emote_color: "green".into(),
        }
    }
}

/// Key names bound to each logical action.
///
/// Names follow the `Ctrl+V`, `Alt+1`, `Esc`, `Up`, `k` convention produced
/// by the terminal layer. Every action accepts several names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub focus_guilds_tree: Vec<String>,
    pub focus_channels_tree: Vec<String>,
    pub focus_messages_panel: Vec<String>,
    pub focus_message_input: Vec<String>,
    pub select_previous_message: Vec<String>,
    pub select_next_message: Vec<String>,
    pub select_first_message: Vec<String>,
    pub select_last_message: Vec<String>,
    pub open_message_actions: Vec<String>,
    pub select_reply: Vec<String>,
    pub open_external_editor: Vec<String>,
    pub cancel: Vec<String>,
    pub quit: Vec<String>,
}

fn names(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_owned()).collect()
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            focus_guilds_tree: names(&["Alt+1"]),
            focus_channels_tree: names(&["Alt+2"]),
            focus_messages_panel: names(&["Alt+3"]),
            focus_message_input: names(&["Alt+4"]),
            select_previous_message: names(&["Up", "k"]),
            select_next_message: names(&["Down", "j"]),
            select_first_message: names(&["Home", "g"]),
            select_last_message: names(&["End", "G"]),
            open_message_actions: names(&["a"]),
            select_reply: names(&["m"]),
            open_external_editor: names(&["Ctrl+E"]),
            cancel: names(&["Esc"]),
            quit: names(&["Ctrl+C"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MurmurConfig::default();
        assert_eq!(cfg.messages_limit, 50);
        assert!(cfg.mouse);
        assert!(cfg.theme.borders);
        assert_eq!(cfg.theme.emote_color, "green");
        assert!(cfg.gateway.token.is_none());
        assert_eq!(cfg.keys.select_previous_message, vec!["Up", "k"]);
    }

    #[test]
    fn bot_token_detection() {
        let mut gateway = GatewayConfig::default();
        assert!(!gateway.is_bot());

        gateway.token = Some(Secret::new("Bot abc.def".into()));
        assert!(gateway.is_bot());

        gateway.token = Some(Secret::new("mfa.user-token".into()));
        assert!(!gateway.is_bot());
    }

    #[test]
    fn identify_properties_skip_empty_fields() {
        let identify = IdentifyConfig {
            user_agent: String::new(),
            browser: "Firefox".into(),
            browser_version: "128.0".into(),
            os: "Linux".into(),
        };
        let props = identify.properties();
        assert!(props.browser_user_agent.is_none());
        assert_eq!(props.browser.as_deref(), Some("Firefox"));
    }

    #[test]
    fn explicit_plugins_dir_wins() {
        let cfg = MurmurConfig {
            plugins_dir: Some(PathBuf::from("/opt/murmur/plugins")),
            ..MurmurConfig::default()
        };
        assert_eq!(cfg.plugins_dir(), Some(PathBuf::from("/opt/murmur/plugins")));
    }
}
