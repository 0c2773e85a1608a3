use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kadstore::{server, Config, Dht};

#[derive(Parser, Debug)]
#[command(name = "kadstore", version, about = "A single-hop DHT-style content store node")]
struct Cli {
    /// Address to listen on: `host:port`, or a bare `:port` to bind every
    /// interface and advertise loopback.
    #[arg(default_value = ":8080")]
    listen: String,

    /// Bootstrap node address (host:port) to join through at startup.
    #[arg(long)]
    bootstrap: Option<String>,

    /// Directory for the per-node snapshot files.
    #[arg(long, default_value = ".")]
    storage_dir: PathBuf,
}

#[tokio::main]
async fn main() -> kadstore::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config {
        listen: cli.listen.clone(),
        bootstrap: cli.bootstrap,
        storage_dir: cli.storage_dir,
        ..Config::default()
    };

    let dht = Arc::new(Dht::new(&config)?);
    info!(id = %dht.id(), address = %dht.local_node().address, "node identity");

    // Join blocks startup; the node only starts serving with whatever table
    // the join pass produced.
    dht.join().await;

    let listener = TcpListener::bind(bind_address(&cli.listen)).await?;
    info!(address = %listener.local_addr()?, "listening");

    server::serve(listener, dht).await?;

    Ok(())
}

/// A bare `:port` listen address binds every interface.
fn bind_address(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    }
}
