//! gossipctl - read, write and push to a running gossipd node

use anyhow::Context;
use clap::{Parser, Subcommand};
use gossipd::logging::{init_tracing, LogFormat};
use lww_gossip_core::canonical::validate_node_name;
use lww_gossip_core::GossipMessage;
use lww_gossip_net::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "gossipctl")]
#[command(author, version, about = "Control client for gossipd", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Node to talk to
    #[arg(short, long, env = "GOSSIP_ADDR", default_value = "127.0.0.1:9100", global = true)]
    addr: SocketAddr,

    /// Connect timeout (milliseconds)
    #[arg(long, default_value = "2000", global = true)]
    timeout_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node's value and generation
    Get,

    /// Write a new value on the node
    Set {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Push a copy as if it came from a peer
    Push {
        #[arg(allow_hyphen_values = true)]
        value: i64,

        generation: u64,

        /// Origin name reported to the node
        #[arg(short, long, default_value = "gossipctl")]
        origin: String,
    },

    /// Check that the node answers
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let directives = if cli.verbose {
        "gossipctl=debug,lww_gossip_net=debug"
    } else {
        "warn"
    };
    init_tracing(directives, LogFormat::Pretty);

    let timeout = Duration::from_millis(cli.timeout_ms);
    let mut client = Client::connect_timeout(cli.addr, timeout)
        .await
        .with_context(|| format!("connecting to {}", cli.addr))?;
    debug!("Connected to {}", client.addr());

    match cli.command {
        Commands::Get => {
            println!("{}", client.get().await?);
        }
        Commands::Set { value } => {
            println!("{}", client.set(value).await?);
        }
        Commands::Push {
            value,
            generation,
            origin,
        } => {
            validate_node_name(&origin)?;
            let msg = GossipMessage {
                value,
                generation,
                origin,
            };
            if client.push(&msg).await? {
                println!("Adopted: {}", msg.snapshot());
            } else {
                println!("Ignored: node already has generation {} or newer", generation);
            }
        }
        Commands::Ping => {
            client.ping().await?;
            println!("{} is alive", client.addr());
        }
    }

    Ok(())
}
