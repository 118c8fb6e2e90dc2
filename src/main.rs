//! Process launcher (§4.7). Parses CLI args, loads configuration into a
//! process-wide `OnceLock`, sets up dual-layer tracing, wires the AI
//! client through the processor registry into the Input Manager, and runs
//! until `Ctrl-C`. Matches the teacher's `main.rs` shape: config first,
//! logging second, runtime third, wiring last.

use std::sync::{Arc, OnceLock};

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

use sentrybus::ai::http_client::HttpCommunityClient;
use sentrybus::ai::stub::StubCommunityClient;
use sentrybus::ai::CommunityClient;
use sentrybus::config::Config;
use sentrybus::manager::Manager;

static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Parser)]
#[command(name = "sentrybus", about = "Multi-channel threat-vector ingestion and AI community review orchestrator")]
struct Cmd {
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Base URL of a production community-review backend. When unset, a
    /// deterministic in-process stub is used instead (fine for local runs
    /// and CI; not for production traffic).
    #[arg(long)]
    ai_backend_url: Option<String>,

    #[arg(long, default_value = "./logs")]
    log_dir: String,
}

#[derive(Debug, serde::Serialize)]
struct StartupInfo {
    mcp_http_port: Option<String>,
    service_registry_enabled: Option<String>,
    service_registry_url: Option<String>,
    service_name: Option<String>,
    service_id: Option<String>,
}

impl StartupInfo {
    fn from_env() -> Self {
        Self {
            mcp_http_port: std::env::var("MCP_HTTP_PORT").ok(),
            service_registry_enabled: std::env::var("SERVICE_REGISTRY_ENABLED").ok(),
            service_registry_url: std::env::var("SERVICE_REGISTRY_URL").ok(),
            service_name: std::env::var("SERVICE_NAME").ok(),
            service_id: std::env::var("SERVICE_ID").ok(),
        }
    }
}

fn init_tracing(log_dir: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "sentrybus.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = Targets::new()
        .with_default(Level::INFO)
        .with_target("sentrybus::esmtp", Level::DEBUG)
        .with_target("sentrybus::webhook::routes", Level::DEBUG);

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(true);
    let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry().with(filter).with(stdout_layer).with(file_layer).init();

    guard
}

fn build_runtime(config: &Config) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.common.core_threads {
        builder.worker_threads(threads);
    }
    builder.build()
}

fn main() {
    let cmd = Cmd::parse();
    let _log_guard = init_tracing(&cmd.log_dir);

    let config = match Config::from_file(&cmd.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config from {}: {e:#}", cmd.config);
            std::process::exit(1);
        }
    };
    let config = CONFIG.get_or_init(|| config);

    info!(startup_info = ?StartupInfo::from_env(), "sentrybus starting up");

    let runtime = match build_runtime(config) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let ai_backend_url = cmd.ai_backend_url.clone();
    runtime.block_on(async move {
        let ai_client: Arc<dyn CommunityClient> = match ai_backend_url {
            Some(url) => Arc::new(HttpCommunityClient::new(url)),
            None => Arc::new(StubCommunityClient::new()),
        };

        let manager = Manager::new(config.clone(), ai_client);

        if let Err(e) = manager.start().await {
            eprintln!("failed to start input manager: {e}");
            std::process::exit(1);
        }

        info!(processors = ?manager.registered_processors(), "sentrybus running");

        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
        info!("shutdown signal received");

        if let Err(e) = manager.shutdown() {
            eprintln!("error during shutdown: {e}");
        }
    });
}
