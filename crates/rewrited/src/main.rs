// # rewrited - DNS Rewrite Registry Daemon
//
// This is a THIN integration layer. All rule logic lives in rewrite-core.
//
// The rewrited daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the sink and loading the rule store
// 4. Serving line-delimited JSON commands from stdin until EOF or a signal
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `REWRITE_SINK_TYPE`: Type of sink (file, memory). Default: file
// - `REWRITE_SINK_PATH`: Path to the rewrites file (for file sink)
// - `REWRITE_LOG_LEVEL`: trace, debug, info, warn, error. Default: info
//
// Logs go to stderr; replies go to stdout.
//
// ## Example
//
// ```bash
// export REWRITE_SINK_TYPE=file
// export REWRITE_SINK_PATH=/var/lib/rewrites/rewrites.json
//
// echo '{"op":"add","domain":"ads.example.com","answer":"0.0.0.0"}' | rewrited
// ```

mod protocol;

use anyhow::Result;
use rewrite_core::{RewriteConfig, RuleStore, SinkConfig, SinkRegistry};
use std::env;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RewriteExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RewriteExitCode> for ExitCode {
    fn from(code: RewriteExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    sink_type: String,
    sink_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            sink_type: env::var("REWRITE_SINK_TYPE").unwrap_or_else(|_| "file".to_string()),
            sink_path: env::var("REWRITE_SINK_PATH").ok(),
            log_level: env::var("REWRITE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.sink_type.as_str() {
            "file" => match self.sink_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "REWRITE_SINK_PATH is required when REWRITE_SINK_TYPE=file. \
                    Set it via: export REWRITE_SINK_PATH=/var/lib/rewrites/rewrites.json"
                ),
                Some(_) => {}
            },
            "memory" => {}
            _ => anyhow::bail!(
                "REWRITE_SINK_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.sink_type
            ),
        }

        self.level()?;
        Ok(())
    }

    /// Parse the configured log level
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "REWRITE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build the library configuration
    fn to_rewrite_config(&self) -> RewriteConfig {
        let sink = match self.sink_path.as_deref() {
            Some(path) if self.sink_type == "file" => SinkConfig::File {
                path: path.to_string(),
            },
            _ => SinkConfig::Memory,
        };
        RewriteConfig::new().with_sink(sink)
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return RewriteExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RewriteExitCode::ConfigError.into();
    }

    info!("Starting rewrited daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RewriteExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let store = match open_store(&config).await {
            Ok(store) => store,
            Err(e) => {
                error!("Startup error: {}", e);
                return RewriteExitCode::ConfigError;
            }
        };

        match serve(store).await {
            Ok(()) => RewriteExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                RewriteExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the sink and load the store
async fn open_store(config: &Config) -> Result<RuleStore> {
    let registry = SinkRegistry::with_builtin();
    let rewrite_config = config.to_rewrite_config();

    info!("Sink type: {}", rewrite_config.sink.type_name());
    let store = RuleStore::from_config(&rewrite_config, &registry).await?;
    info!("Loaded {} rewrite rule(s)", store.len().await);

    Ok(store)
}

/// Serve commands from stdin until EOF or a shutdown signal
async fn serve(store: RuleStore) -> Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut stdout = tokio::io::stdout();

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    info!("Ready for commands on stdin");

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                info!("Received shutdown signal: {}", signal?);
                break;
            }
            line = lines.next() => {
                let line = match line {
                    Some(line) => line?,
                    None => {
                        info!("stdin closed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let reply = protocol::handle_line(&store, &line).await;
                let mut out = serde_json::to_string(&reply)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    info!("Shutting down daemon with {} rule(s)", store.len().await);
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
