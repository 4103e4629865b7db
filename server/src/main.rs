use clap::Parser;
use env_logger::Env;
use log::{error, info};
use skirmish_server::config::GameConfig;
use skirmish_server::network::Server;
use skirmish_server::ServerResult;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Simulation ticks per second (overrides the config file)
    #[arg(short, long)]
    tick_rate: Option<u32>,

    /// Maximum concurrent sessions (overrides the config file)
    #[arg(short, long)]
    max_clients: Option<usize>,

    /// JSON file with gameplay tuning
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Let player projectiles hit other players
    #[arg(long)]
    pvp: bool,

    /// Seed for agent spawn placement
    #[arg(long)]
    seed: Option<u64>,

    /// Disconnect sessions silent for this many seconds (0 disables)
    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

impl Args {
    fn game_config(&self) -> ServerResult<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };

        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if self.pvp {
            config.combat.pvp = true;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(secs) = self.idle_timeout_secs {
            config.idle_timeout_secs = secs;
        }
        if config.tick_rate == 0 {
            return Err("tick rate must be at least 1".into());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.game_config()?;

    info!("Starting server...");
    info!(
        "Tick rate {}Hz, max {} clients, pvp {}",
        config.tick_rate,
        config.max_clients,
        if config.combat.pvp { "on" } else { "off" }
    );

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
