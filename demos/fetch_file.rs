//! Fetch a file from a device and save it locally.
//!
//! Demonstrates:
//! - Building a SessionConfig for a device host
//! - Connecting with the WebSocket provider and a tracing sink
//! - Fetching a file as base64 and downloading it into a directory
//! - Shutting the session down
//!
//! Usage:
//!   cargo run --example fetch_file -- <host> <path>
//!   cargo run --example fetch_file -- raspberrypi.local:8443 /etc/hostname --debug
//!   cargo run --example fetch_file -- raspberrypi.local:8443 /etc/hostname --out ./downloads

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use device_link::{Device, DirectorySink, Result, SessionConfig, TracingSink, WsProvider};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    host: String,
    path: String,
    out: Option<PathBuf>,
    debug: bool,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Option<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let positional: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, a)| !a.starts_with("--") && (*i == 0 || args[i - 1] != "--out"))
            .map(|(_, a)| a)
            .collect();

        let out = args
            .iter()
            .position(|a| a == "--out")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from);

        Some(Self {
            host: positional.first()?.to_string(),
            path: positional.get(1)?.to_string(),
            out,
            debug: args.iter().any(|a| a == "--debug"),
        })
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let Some(args) = Args::parse() else {
        eprintln!("usage: fetch_file <host> <path> [--out <dir>] [--debug]");
        std::process::exit(2);
    };
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Fetch File ===\n");

    let config = SessionConfig::builder()
        .host(&args.host)
        .response_timeout(Duration::from_secs(30))
        .build()?;
    println!("[Connect] {}", config.endpoint);

    let device = Device::connect(
        config,
        Arc::new(WsProvider::new()),
        Arc::new(TracingSink::new()),
    );

    match &args.out {
        Some(dir) => {
            let name = device
                .download_file(&args.path, &DirectorySink::new(dir))
                .await?;
            println!("        ✓ Saved {}", dir.join(name).display());
        }
        None => {
            let contents = device.get_file(&args.path).await?;
            println!("        ✓ {} ({} base64 chars)", args.path, contents.len());
            println!("{contents}");
        }
    }

    device.session().shutdown();
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "device_link=debug"
    } else {
        "device_link=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
