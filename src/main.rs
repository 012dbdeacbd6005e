use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use soulstat_backend::BackendClient;
use soulstat_backend::http::default_client;
use soulstat_core::Config;
use soulstat_gateway::GatewayServer;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "soulstat", version, about = "Soul Stat analysis proxy")]
struct Cli {
    /// Config file (falls back to `SOULSTAT_CONFIG`, then `config/default.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP proxy (default)
    Serve,
    /// Split a markdown deep report into chapters and print them as JSON
    Segment {
        /// Report file, `-` for stdin
        file: PathBuf,
    },
    /// Print the effective configuration and validate it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);
    init_subscriber(&config_path);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config_path).await,
        Command::Segment { file } => {
            let report = read_report(&file).await?;
            println!("{}", render_chapters(&report)?);
            Ok(())
        }
        Command::CheckConfig => {
            let config = Config::load(&config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
            config.validate()
        }
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    config.validate()?;
    tracing::info!("config loaded from {}", config_path.display());

    let backend = build_backend(&config);
    if let Err(e) = backend.health().await {
        tracing::warn!("analysis backend at {} not reachable yet: {e}", backend.base_url());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.server.bind,
        config.server.port,
        backend,
        shutdown_rx,
    )
    .with_rate_limit(config.server.rate_limit)
    .with_max_body_size(config.server.max_body_size)
    .with_allowed_origins(config.server.allowed_origins.clone())
    .serve()
    .await
    .context("proxy server failed")
}

fn build_backend(config: &Config) -> BackendClient {
    let backend = &config.backend;
    BackendClient::new(&backend.base_url)
        .with_client(default_client(backend.connect_timeout()))
        .with_timeout(backend.timeout())
        .with_deep_timeout(backend.deep_timeout())
        .with_max_response_bytes(backend.max_response_bytes)
}

async fn read_report(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        return read_all(tokio::io::stdin())
            .await
            .context("failed to read report from stdin");
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read report {}", path.display()))
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await?;
    Ok(buf)
}

fn render_chapters(report: &str) -> anyhow::Result<String> {
    let chapters = soulstat_report::segment(report);
    tracing::debug!(chapters = ?chapters.keys(), "report segmented");
    serde_json::to_string_pretty(&chapters).context("failed to serialize chapters")
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var("SOULSTAT_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn init_subscriber(config_path: &Path) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let config = Config::load(config_path).ok();
    let level = config.as_ref().map_or("info", |c| c.logging.level.as_str());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    // stdout is reserved for command output
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    #[cfg(feature = "otel")]
    {
        let use_otlp = config
            .as_ref()
            .is_some_and(|c| c.observability.exporter == "otlp");

        if use_otlp {
            let endpoint = config
                .as_ref()
                .map_or("http://localhost:4317", |c| &c.observability.endpoint);

            match setup_otel_tracer(endpoint) {
                Ok(tracer) => {
                    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer)
                        .with(otel_layer)
                        .init();
                    return;
                }
                Err(e) => {
                    eprintln!("OTel initialization failed, falling back to fmt: {e}");
                }
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(feature = "otel")]
fn setup_otel_tracer(endpoint: &str) -> anyhow::Result<opentelemetry_sdk::trace::SdkTracer> {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer("soulstat");
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracer)
}
