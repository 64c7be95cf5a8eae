// CLASSIFICATION: COMMUNITY
// Filename: tracectl.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tracer_ctrl::config::CtrlConfig;
use tracer_ctrl::ctrl::registry::EntryInfo;
use tracer_ctrl::ctrl::{CtrlClient, SOCKOPT_GET_REGISTRY, SOCKOPT_GET_VERSION};

#[derive(Parser)]
#[command(about = "Query and tune a running tracer agent")]
struct Cli {
    /// Control socket path
    #[arg(long, short)]
    socket: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Read a sockopt value
    Get {
        id: u32,
        /// Request payload as hex
        #[arg(long)]
        input: Option<String>,
        /// Print the reply as UTF-8 text instead of hex
        #[arg(long)]
        text: bool,
    },
    /// Write a sockopt value
    Set {
        id: u32,
        /// Value as hex
        #[arg(required_unless_present = "text")]
        value: Option<String>,
        /// Value as UTF-8 text
        #[arg(long, conflicts_with = "value")]
        text: Option<String>,
    },
    /// Print the agent's control protocol version
    Version,
    /// List registered sockopt ranges
    List,
}

fn decode_hex(arg: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(arg.trim_start_matches("0x")).with_context(|| format!("invalid hex {arg:?}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut cfg = CtrlConfig::from_env()?;
    if let Some(path) = cli.socket {
        cfg.socket_path = path;
    }
    let mut client = CtrlClient::connect(&cfg.socket_path)
        .with_context(|| format!("connect {}", cfg.socket_path.display()))?
        .with_max_payload(cfg.max_payload);

    match cli.cmd {
        Cmd::Get { id, input, text } => {
            let input = input.as_deref().map(decode_hex).transpose()?.unwrap_or_default();
            let out = client.get(id, &input)?;
            if text {
                println!("{}", String::from_utf8_lossy(&out));
            } else {
                println!("{}", hex::encode(out));
            }
        }
        Cmd::Set { id, value, text } => {
            let input = match (value, text) {
                (_, Some(t)) => t.into_bytes(),
                (Some(v), None) => decode_hex(&v)?,
                (None, None) => Vec::new(),
            };
            client.set(id, &input)?;
            println!("ok");
        }
        Cmd::Version => {
            let out = client.get(SOCKOPT_GET_VERSION, &[])?;
            let raw: [u8; 4] = out
                .as_slice()
                .try_into()
                .context("version reply is not 4 bytes")?;
            let v = u32::from_ne_bytes(raw);
            println!("{}.{}.{}", v >> 16, (v >> 8) & 0xff, v & 0xff);
        }
        Cmd::List => {
            let out = client.get(SOCKOPT_GET_REGISTRY, &[])?;
            let entries: Vec<EntryInfo> = serde_json::from_slice(&out)?;
            for e in entries {
                let fmt = |r: Option<[u32; 2]>| match r {
                    Some([lo, hi]) => format!("{lo}-{hi}"),
                    None => "-".into(),
                };
                println!("{:<16} get {:<12} set {}", e.name, fmt(e.get), fmt(e.set));
            }
        }
    }
    Ok(())
}
