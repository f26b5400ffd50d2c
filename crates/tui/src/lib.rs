//! Terminal chat client: gateway sync, guild tree, message panel and the
//! message action menu.

mod actions;
mod app;
mod attachments;
mod connection;
mod desktop;
mod editor;
pub mod error;
mod events;
mod keys;
mod markup;
mod navigation;
mod remote;
mod rpc;
mod state;
mod tree;
mod ui;
mod view;

use {
    crate::{
        app::{AppContext, set_mouse_capture},
        connection::ConnectionManager,
        desktop::{Desktop, SystemDesktop},
        remote::{GatewayClient, RemoteClient},
        rpc::RpcClient,
    },
    murmur_config::MurmurConfig,
    murmur_plugins::PluginRegistry,
    murmur_protocol::IdentifyParams,
    secrecy::ExposeSecret,
    std::sync::Arc,
    tokio::sync::mpsc,
};

pub use {app::App, error::Error};

/// Editor used when `$EDITOR` is unset.
const DEFAULT_EDITOR: &str = "vi";

/// Entry point for the TUI client.
///
/// Connects to `config.gateway.url` with the configured token and runs until
/// the quit key is pressed. `plugins` stay loaded for the whole session.
pub async fn run_tui(config: MurmurConfig, plugins: PluginRegistry) -> Result<(), Error> {
    // Install the rustls ring crypto provider for TLS connections.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let Some(token) = config.gateway.token.as_ref() else {
        return Err(Error::Auth(
            "no token configured; set gateway.token or MURMUR_TOKEN".into(),
        ));
    };
    let identify = IdentifyParams {
        token: token.expose_secret().clone(),
        properties: config.identify.properties(),
        compress: false,
    };

    let (connection_tx, connection_rx) = mpsc::unbounded_channel();
    let connection = Arc::new(ConnectionManager::spawn(
        config.gateway.url.clone(),
        identify,
        connection_tx,
    ));
    let rpc = Arc::new(RpcClient::new(connection));
    let remote: Arc<dyn RemoteClient> = Arc::new(GatewayClient::new(
        Arc::clone(&rpc),
        &config.identify.user_agent,
    )?);
    let desktop: Arc<dyn Desktop> = Arc::new(SystemDesktop::default());

    let context = AppContext {
        plugins: plugins.len(),
        cache_dir: murmur_config::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("murmur")
            .join("attachments"),
        editor: std::env::var("EDITOR").unwrap_or_else(|_| DEFAULT_EDITOR.into()),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let app = App::new(&config, context, remote, desktop, event_tx);

    let terminal = ratatui::init();
    set_mouse_capture(config.mouse);
    let result = app.run(terminal, event_rx, connection_rx, rpc).await;
    set_mouse_capture(false);
    ratatui::restore();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_an_auth_error() {
        let config = MurmurConfig::default();
        let result = run_tui(config, PluginRegistry::empty()).await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }
}
