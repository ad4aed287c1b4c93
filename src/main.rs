use std::env;
use std::error::Error;
use std::process;

use clap::Parser;
use tokio::signal::unix::SignalKind;

mod bridge;
mod cli;
mod config;
mod error;
mod gadget;
mod hid_function;
mod report;

use bridge::Bridge;
use config::BridgeConfig;

/// Top-level guard: any unhandled panic prints the message and a backtrace
/// to stderr and exits 1, instead of the default abort (per spec §7's
/// propagation policy).
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("fatal: {info}");
        eprintln!("{}", std::backtrace::Backtrace::capture());
        process::exit(1);
    }));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    install_panic_hook();
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args = cli::Args::parse();
    if let Some(cmd) = args.cmd.as_ref() {
        if !matches!(cmd, cli::Commands::Run) {
            let code = cli::main_cli(args).await?;
            process::exit(code);
        }
    }

    log::info!("Starting ds3-bridge v{VERSION}");

    let config = load_config();
    if let Err(e) = stage_shared_library(&config) {
        log::warn!("failed to stage shared library: {e}");
    }

    let mut bridge = match Bridge::start(config).await {
        Ok(bridge) => bridge,
        Err(e) => {
            log::error!("failed to start bridge: {e}");
            process::exit(1);
        }
    };
    log::info!("bridge listening on {}", bridge.local_addr());

    let mut sig_term = tokio::signal::unix::signal(SignalKind::terminate())?;
    let mut sig_int = tokio::signal::unix::signal(SignalKind::interrupt())?;

    let mut exit_code = 0;
    tokio::select! {
        result = bridge.run() => {
            if let Err(e) = result {
                log::error!("bridge run loop exited with an error: {e}");
                exit_code = 1;
            }
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("received CTRL+C, shutting down");
        },
        _ = sig_int.recv() => {
            log::info!("received SIGINT, shutting down");
        },
        _ = sig_term.recv() => {
            log::info!("received SIGTERM, shutting down");
        },
    }

    if let Err(e) = bridge.release().await {
        log::error!("error releasing bridge: {e}");
        exit_code = 1;
    }

    log::info!("ds3-bridge stopped");
    process::exit(exit_code);
}

/// Build the effective configuration: defaults, optionally overridden by
/// `--config <path>` (via `DS3_BRIDGE_CONFIG`, since the interactive client
/// and daemon share no argument parser for this).
fn load_config() -> BridgeConfig {
    match env::var("DS3_BRIDGE_CONFIG") {
        Ok(path) => match BridgeConfig::from_yaml_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("failed to load config from {path}: {e}; using defaults");
                BridgeConfig::default()
            }
        },
        Err(_) => BridgeConfig::default(),
    }
}

/// Stage the shared library the host side expects to find alongside the
/// bridge, creating `bridge_dir` first if needed. A no-op once the file is
/// already present.
fn stage_shared_library(config: &BridgeConfig) -> std::io::Result<()> {
    let dest = config.staged_library_path();
    if std::path::Path::new(&dest).exists() {
        return Ok(());
    }
    std::fs::create_dir_all(&config.bridge_dir)?;
    let bundled = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/libaio.so");
    if std::path::Path::new(bundled).exists() {
        std::fs::copy(bundled, dest)?;
    }
    Ok(())
}
