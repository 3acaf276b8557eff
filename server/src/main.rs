use clap::Parser;
use log::info;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Maximum number of players in the room
    #[arg(short, long, default_value_t = shared::DEFAULT_MAX_PLAYERS)]
    max_players: usize,

    /// Full-state sync broadcasts per second
    #[arg(short, long, default_value = "10")]
    sync_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let sync_interval = Duration::from_secs_f64(1.0 / args.sync_rate.max(1) as f64);

    info!(
        "Starting bubble-pop server on {} (max {} players, sync every {:?})",
        address, args.max_players, sync_interval
    );

    let mut server = Server::new(&address, sync_interval, args.max_players).await?;
    server.run().await?;

    Ok(())
}
