//! gossipd - LWW register gossip daemon
//!
//! Holds one integer register, pushes it to a few peers every round and
//! adopts any pushed copy with a higher generation.

use clap::Parser;
use gossipd::config::Config;
use gossipd::logging::{default_directives, init_tracing};
use gossipd::server::Server;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(default_directives(config.verbose), config.log_format);

    info!(
        "gossipd v{} - LWW register gossip daemon",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:#}", e);
        return ExitCode::FAILURE;
    }

    let server = Arc::new(Server::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_server.shutdown();
        }
    });

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
