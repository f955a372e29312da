// Interactive game loop commands
use pump_vote_sim::core::types::format_price;
use pump_vote_sim::{
    Command, Config, GameRunner, GameResult, JsonLinesSink, RenderSink, SimulationEngine,
    TracingRenderSink, VoteDirection, WalletIdentityProvider,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Parse one line of user input into a command
pub fn parse_command(line: &str) -> Option<Command> {
    let word = line.trim().to_ascii_lowercase();
    match word.as_str() {
        "" => None,
        "connect" => Some(Command::Connect),
        "quit" | "exit" => Some(Command::Quit),
        other => match other.parse::<VoteDirection>() {
            Ok(direction) => Some(Command::Vote(direction)),
            Err(e) => {
                warn!("⚠️  {}", e);
                None
            }
        },
    }
}

pub async fn run_game(
    seconds: Option<u64>,
    public_key: Option<String>,
    json: bool,
    mut config: Config,
) -> GameResult<()> {
    if public_key.is_some() {
        config.identity.public_key = public_key;
    }

    let sink: Box<dyn RenderSink> = if json {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(TracingRenderSink::new(config.logging.enable_price_logging))
    };

    let provider = WalletIdentityProvider::from_config(&config.identity);
    let engine = SimulationEngine::builder(config).with_boxed_sink(sink).build()?;

    info!("🎮 Commands: connect | pump | dump | quit");
    match seconds {
        Some(s) => info!("⏱️  Running for {}s (Ctrl+C to stop early)", s),
        None => info!("⏱️  Running until quit or Ctrl+C"),
    }

    let (tx, rx) = mpsc::channel(32);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = parse_command(&line) {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
        }
    });

    let shutdown = async move {
        match seconds {
            Some(s) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = tokio::time::sleep(Duration::from_secs(s)) => {}
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("⚠️  Ctrl+C handler unavailable: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    };

    let engine = GameRunner::new(engine, provider, rx).run(shutdown).await;
    reader.abort();

    print_summary(&engine);
    Ok(())
}

fn print_summary(engine: &SimulationEngine) {
    let stats = engine.stats();
    let price = engine.simulator().current_price();

    info!("");
    info!("📊 Session Summary");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("💰 Final price: {} ({:+.2}% since start)", format_price(price), engine.simulator().growth_since_start());
    info!("📈 Peak price:  {}", format_price(stats.peak_price));
    info!("🎲 Rounds: {} (pump {} / dump {} / tie {} / empty {})",
        stats.rounds_resolved, stats.pump_wins, stats.dump_wins, stats.ties, stats.empty_rounds);
    info!("🗳️  Votes: {} accepted, {} switched, {} rejected",
        stats.votes_cast, stats.votes_switched, stats.votes_rejected);
    info!("⏱️  Price ticks: {}", stats.price_ticks);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
