// CLASSIFICATION: COMMUNITY
// Filename: tracer_ctrld.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use tracer_ctrl::config::CtrlConfig;
use tracer_ctrl::ctrl::{CtrlInfo, CtrlServer, SockoptRegistry, SOCKOPT_VERSION};

#[derive(Parser)]
#[command(about = "Tracer control socket daemon")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Override the control socket path
    #[arg(long, short)]
    socket: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => {
            let mut cfg = CtrlConfig::load(path)?;
            cfg.apply_env()?;
            cfg
        }
        None => CtrlConfig::from_env()?,
    };
    if let Some(path) = cli.socket {
        cfg.socket_path = path;
    }

    let registry = Arc::new(SockoptRegistry::new());
    CtrlInfo::register(&registry).context("register builtin sockopts")?;

    let server = CtrlServer::bind(&cfg, registry)
        .with_context(|| format!("bind {}", cfg.socket_path.display()))?;
    info!(
        "tracer-ctrld protocol {:#x}, max payload {} bytes",
        SOCKOPT_VERSION, cfg.max_payload
    );
    server.run()?;
    Ok(())
}
