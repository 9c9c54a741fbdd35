use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use hsns_local::config::{self, AppState, Config, Overrides};
use hsns_local::error::StartupError;
use hsns_local::{logger, server};

/// Serve a directory over HTTP and accept token-described uploads into it
#[derive(Debug, Parser)]
#[command(name = "hsns-local", version, about)]
struct Cli {
    /// Config file path (without extension)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: String,

    /// Directory to serve and store uploads in
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match start(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[FATAL] {e}");
            ExitCode::FAILURE
        }
    }
}

fn start(cli: &Cli) -> Result<(), StartupError> {
    let overrides = Overrides {
        root: cli.root.clone(),
        host: cli.host.clone(),
        port: cli.port,
    };
    let cfg = Config::load_from(&cli.config, &overrides)?;
    logger::init(&cfg)?;

    // Root directory is checked before anything binds
    let state = Arc::new(AppState::new(cfg)?);
    let addr = state.config.socket_addr()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = state.config.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async move {
        let listener =
            server::create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;
        logger::log_server_start(&addr, &state.config, &state.root);
        server::run(listener, state, server::signal::shutdown_signal()).await;
        Ok::<(), StartupError>(())
    })
}
