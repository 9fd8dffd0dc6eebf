use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codeassist::config::ServerConfig;
use codeassist::engine::OutputKind;
use codeassist::service::CompletionService;
use codeassist::{build_router, AppState};

#[derive(Parser)]
#[command(name = "codeassist", about = "Code intelligence over HTTP for browser editors.")]
struct Cli {
    /// YAML config file (defaults to ./codeassist.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum cached analysis contexts (0 = unbounded)
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Directory searched for logical reference names (repeatable)
    #[arg(long = "reference-path")]
    reference_paths: Vec<PathBuf>,

    /// Do not load the bundled std prelude
    #[arg(long)]
    no_prelude: bool,

    /// Describe completion items up front instead of on resolve
    #[arg(long)]
    eager_descriptions: bool,

    /// Output mode for requests that do not name one
    #[arg(long, value_parser = parse_output_kind)]
    output_kind: Option<OutputKind>,
}

fn parse_output_kind(raw: &str) -> Result<OutputKind, String> {
    match raw.to_ascii_lowercase().as_str() {
        "library" => Ok(OutputKind::Library),
        "executable" => Ok(OutputKind::Executable),
        other => Err(format!("unknown output kind '{other}' (library or executable)")),
    }
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = capacity;
        }
        if !self.reference_paths.is_empty() {
            config.reference_paths = self.reference_paths;
        }
        if self.no_prelude {
            config.bundled_prelude = false;
        }
        if self.eager_descriptions {
            config.eager_descriptions = true;
        }
        if let Some(kind) = self.output_kind {
            config.default_output_kind = kind;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter '{}'", config.log_filter))?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let service = CompletionService::from_config(&config);
    let state = Arc::new(AppState::new(Arc::new(service)));
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        cache_capacity = config.cache_capacity,
        references = config.reference_paths.len(),
        "codeassist listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
