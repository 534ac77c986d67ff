//! # Tessera - Embeddable Object Store
//!
//! The main binary for the Tessera in-memory object store.
//!
//! This application provides:
//! - CLI interface for collection, relation, and group operations
//! - Snapshot file persistence between invocations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/tessera (THE BINARY)              │
//! │                                                      │
//! │  ┌─────────────┐      ┌───────────────────────────┐  │
//! │  │   CLI       │      │  Snapshot file I/O        │  │
//! │  │  (clap)     │      │  (load / operate / save)  │  │
//! │  └──────┬──────┘      └────────────┬──────────────┘  │
//! │         │                          │                 │
//! │         └────────────┬─────────────┘                 │
//! │                      ▼                               │
//! │              ┌───────────────┐                       │
//! │              │ tessera-core  │                       │
//! │              │  (THE LOGIC)  │                       │
//! │              └───────────────┘                       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Collection operations
//! tessera insert -c notes -r '{"name": "first", "rank": 1}'
//! tessera find -c notes -q '{"rank": {"gte": 1}}' --order-by rank
//!
//! # Relations and groups
//! tessera relate -s obj.a -r contains_group -o obj.b
//! tessera subgroups -g obj.a --recursive
//! ```

use clap::Parser;
use tessera::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — TESSERA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TESSERA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tessera=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Tessera startup banner.
fn print_banner() {
    println!(
        r#"
  ████████╗███████╗███████╗███████╗███████╗██████╗  █████╗
  ╚══██╔══╝██╔════╝██╔════╝██╔════╝██╔════╝██╔══██╗██╔══██╗
     ██║   █████╗  ███████╗███████╗█████╗  ██████╔╝███████║
     ██║   ██╔══╝  ╚════██║╚════██║██╔══╝  ██╔══██╗██╔══██║
     ██║   ███████╗███████║███████║███████╗██║  ██║██║  ██║
     ╚═╝   ╚══════╝╚══════╝╚══════╝╚══════╝╚═╝  ╚═╝╚═╝  ╚═╝

  Embeddable Object Store v{}

  Collections • Relations • Closures
"#,
        env!("CARGO_PKG_VERSION")
    );
}
