use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    murmur_config::MurmurConfig,
    murmur_plugins::PluginRegistry,
    secrecy::Secret,
    std::{fs::OpenOptions, path::PathBuf, sync::Mutex},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "murmur", about = "Murmur, a terminal chat client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Log file (defaults to `murmur.log` in the data directory).
    #[arg(long, global = true, env = "MURMUR_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Custom config directory (overrides default ~/.config/murmur/).
    #[arg(long, global = true, env = "MURMUR_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Gateway WebSocket URL (overrides config value).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Account token (overrides config value).
    #[arg(long, global = true, env = "MURMUR_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat client (default when no subcommand is provided).
    Chat,
    /// Load the plugin directory and list what was loaded.
    Plugins,
}

/// Initialise tracing. The terminal belongs to the UI, so logs go to a file.
fn init_telemetry(cli: &Cli) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let path = match &cli.log_file {
        Some(path) => path.clone(),
        None => murmur_config::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("murmur.log"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let writer = Mutex::new(file);

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(writer),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
    }
    Ok(())
}

/// Load the config file, then apply command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<MurmurConfig> {
    let mut config = murmur_config::discover_and_load(cli.config_dir.as_deref())?;
    if let Some(url) = &cli.url {
        config.gateway.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.gateway.token = Some(Secret::new(token.clone()));
    }
    Ok(config)
}

/// Plugin failures never stop the client; it runs without plugins instead.
fn load_plugins(config: &MurmurConfig) -> PluginRegistry {
    let Some(dir) = config.plugins_dir() else {
        return PluginRegistry::empty();
    };
    match PluginRegistry::load(&dir) {
        Ok(registry) => registry,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to load plugins");
            PluginRegistry::empty()
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli)?;
    info!(version = env!("CARGO_PKG_VERSION"), "murmur starting");

    let config = load_config(&cli)?;
    let plugins = load_plugins(&config);

    match cli.command {
        None | Some(Commands::Chat) => {
            info!(plugins = plugins.len(), url = %config.gateway.url, "opening chat");
            murmur_tui::run_tui(config, plugins).await?;
            Ok(())
        },
        Some(Commands::Plugins) => {
            if plugins.is_empty() {
                println!("no plugins loaded");
            }
            for plugin in plugins.iter() {
                println!(
                    "{}\t{}\t{}",
                    plugin.name(),
                    plugin.path().display(),
                    plugin.export_names().join(",")
                );
            }
            Ok(())
        },
    }
}
