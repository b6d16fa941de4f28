use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cloudgate::aws::AwsBackends;
use cloudgate::config::Config;
use cloudgate::resource::ResourceKind;
use cloudgate::{build_router, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// HTTP gateway for SQS, SNS and DynamoDB
#[derive(Parser, Debug)]
#[command(name = "cloudgate", version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Provider region
    #[arg(short, long)]
    region: Option<String>,

    /// SQS endpoint URL (empty for the regional endpoint)
    #[arg(long)]
    sqs_endpoint: Option<String>,

    /// SNS endpoint URL (empty for the regional endpoint)
    #[arg(long)]
    sns_endpoint: Option<String>,

    /// DynamoDB endpoint URL (empty for the regional endpoint)
    #[arg(long)]
    dynamodb_endpoint: Option<String>,

    /// Config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to a file instead of stderr; without a value the file goes
    /// to the user config directory
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    log_file: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `--log-level`
fn setup_logging(
    level: LogLevel,
    log_file: Option<String>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
        return Ok(None);
    };

    let log_path = if log_path.is_empty() {
        default_log_path()
    } else {
        PathBuf::from(log_path)
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn default_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cloudgate").join("cloudgate.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cloudgate").join("cloudgate.log");
    }
    PathBuf::from("cloudgate.log")
}

/// Defaults, then config file, then environment, then flags
fn build_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());

    if let Some(bind) = &args.bind {
        config.bind = bind.clone();
    }
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    for (kind, endpoint) in [
        (ResourceKind::Queue, &args.sqs_endpoint),
        (ResourceKind::Topic, &args.sns_endpoint),
        (ResourceKind::Table, &args.dynamodb_endpoint),
    ] {
        if let Some(endpoint) = endpoint {
            config.endpoints.set(kind, endpoint.clone());
        }
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.clone())?;
    tracing::info!("cloudgate {} starting", VERSION);

    let config = build_config(&args)?;
    for kind in ResourceKind::ALL {
        tracing::info!("{} endpoint: {}", kind.service(), config.endpoint_url(kind));
    }

    let backends = AwsBackends::new(&config).context("Failed to create AWS client")?;
    let app = build_router(Arc::new(backends));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
