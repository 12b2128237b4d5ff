//! Tracing subscriber setup shared by the binaries

use clap::ValueEnum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber. `RUST_LOG` overrides `default_directives`.
pub fn init_tracing(default_directives: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
}

/// Default directives for the daemon
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "gossipd=debug,lww_gossip_net=debug"
    } else {
        "gossipd=info,lww_gossip_net=info"
    }
}
