//! CLI entrypoint for the interactive server console.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use transport::{TcpTransport, Transport};

use console::config::Config;
use console::render::Renderer;
use console::session::SessionController;

/// Command-line arguments for the ledterm console.
#[derive(Parser)]
#[command(name = "ledterm")]
#[command(about = "Interactive console for an LED animation server", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Server host to connect to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port to connect to (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.ledterm/logs/debug.log
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Run without touching the terminal (no raw mode, no drawing)
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing — the scroll region owns stdout, so console output
    // is sunk except in quiet mode. When --debug is passed, write
    // debug-level logs to ~/.ledterm/logs/debug.YYYY-MM-DD.log with daily
    // rotation so logs accumulate across sessions.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home).join(".ledterm").join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (cli.quiet, debug_writer) {
        (quiet, Some(writer)) => {
            let console = if quiet {
                fmt::layer().with_target(false).boxed()
            } else {
                fmt::layer()
                    .with_writer(std::io::sink)
                    .with_target(false)
                    .boxed()
            };
            let console = console.with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            tracing_subscriber::registry().with(console).with(file).init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_target(false)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
    }

    if cli.debug {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            log_level = %cli.log_level,
            "========== ledterm session start =========="
        );
    }

    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Failed to load config ({e}), using defaults");
        Config::default()
    });
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.quiet {
        config.terminal.quiet = true;
    }
    config.validate()?;

    let (event_tx, event_rx) = mpsc::channel(64);
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new(event_tx));
    let renderer = Renderer::new(config.terminal.quiet)?;

    let mut session = SessionController::new(transport, renderer, &config);
    session.start(event_rx).await?;
    Ok(())
}
