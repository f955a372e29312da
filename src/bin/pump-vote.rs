// Pump/Dump Voting Simulator - CLI
// Interactive game loop plus headless fast-forward runs

use clap::{Parser, Subcommand};
use pump_vote_sim::{Config, ConfigError};
use std::path::Path;
use tracing::{error, info, warn, Level};

// Load command modules from cli directory
#[path = "../cli/run_commands.rs"]
mod run_commands;
#[path = "../cli/simulate_commands.rs"]
mod simulate_commands;

#[derive(Parser)]
#[command(name = "pump-vote")]
#[command(version)]
#[command(about = "Pump/Dump voting price simulator", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Play live: type connect, pump, dump or quit on stdin
    Run {
        /// Stop after this many seconds
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Wallet public key (overrides identity.public_key)
        #[arg(short, long)]
        key: Option<String>,

        /// Emit render events as JSON lines on stdout
        #[arg(long)]
        json: bool,
    },

    /// Fast-forward rounds with scripted voters
    Simulate {
        /// Number of rounds to play
        #[arg(short, long, default_value = "10")]
        rounds: u64,

        /// Number of scripted voters
        #[arg(long, default_value = "100")]
        voters: usize,

        /// Probability a voter picks pump
        #[arg(long, default_value = "0.5")]
        pump_bias: f64,

        /// Fraction of voters voting each round
        #[arg(long, default_value = "0.6")]
        participation: f64,

        /// Round length override in seconds
        #[arg(long)]
        round_seconds: Option<u64>,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config is read before logging so its log_level applies; errors are reported after init
    let loaded = Config::from_file(&cli.config);
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        loaded
            .as_ref()
            .ok()
            .and_then(|c| c.logging.log_level.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 Pump/Dump Simulator v{}", env!("CARGO_PKG_VERSION"));
    info!("📁 Config: {}", cli.config);

    match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init { force } => {
            init_config(&cli.config, force)?;
        }

        Commands::Run { seconds, key, json } => {
            let config = config_or_exit(&cli.config, loaded);
            run_commands::run_game(seconds, key, json, config).await?;
        }

        Commands::Simulate { rounds, voters, pump_bias, participation, round_seconds, seed, json } => {
            let config = config_or_exit(&cli.config, loaded);
            let options = simulate_commands::SimulateOptions {
                rounds,
                voters,
                pump_bias,
                participation,
                round_seconds,
                seed,
                json,
            };
            if let Err(e) = simulate_commands::run_simulation(options, config) {
                error!("❌ {}", e.user_message());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Missing file falls back to defaults; a broken file exits with a hint
fn config_or_exit(path: &str, loaded: Result<Config, ConfigError>) -> Config {
    match loaded {
        Ok(config) => config,
        Err(_) if !Path::new(path).exists() => {
            warn!("⚠️  {} not found, using built-in defaults", path);
            info!("💡 Run: pump-vote init");
            Config::default()
        }
        Err(e) => {
            error!("❌ Configuration Error");
            error!("{}", e);
            error!("");
            error!("💡 Quick fix:");
            error!("   1. Check {} against config.toml.example", path);
            error!("   2. Or regenerate it: pump-vote init --force");
            std::process::exit(1);
        }
    }
}

fn init_config(path: &str, force: bool) -> Result<(), ConfigError> {
    info!("🔧 Initializing configuration...");

    if Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping", path);
        return Ok(());
    }

    Config::default().to_file(path)?;
    info!("📝 Created {}", path);
    info!("✅ Ready!");
    info!("💡 Next steps:");
    info!("   1. Set identity.public_key in {}", path);
    info!("   2. Run: pump-vote run");
    info!("   3. Or fast-forward: pump-vote simulate --rounds 5");

    Ok(())
}
