use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use flowstore::config::StoreConfig;
use flowstore::counter::{CounterAction, CounterReducer, CounterState};
use flowstore::logging::init_tracing;
use flowstore::{Persistence, Store, StoreBuilder};

/// Persisted counter driven by a flowstore store.
#[derive(Debug, Parser)]
#[command(name = "flowstore", version)]
struct Cli {
    /// Config file (default: $FLOWSTORE_CONFIG or ~/.config/flowstore/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for persisted state, overrides the config file
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current state
    Show,
    /// Increase the counter
    Increment {
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Decrease the counter
    Decrement,
    /// Set the message
    Message { text: String },
    /// Restore the default state
    Reset,
    /// Run the background ticker and wait for it to finish
    Tick {
        #[arg(long, default_value_t = 3)]
        count: u32,
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StoreConfig::load_from(path)?,
        None => StoreConfig::load()?,
    };
    if let Some(dir) = cli.state_dir {
        config.persistence.directory = Some(dir);
    }
    init_tracing(&config.logging);

    let persistence = Persistence::<CounterState>::from_config(&config.persistence)?;
    let store = StoreBuilder::new(CounterReducer)
        .with_config(&config)
        .build_persisted(CounterState::default(), persistence);

    match cli.command {
        Command::Show => {}
        Command::Increment { times } => store.dispatch(CounterAction::IncrementBy { times }),
        Command::Decrement => store.dispatch(CounterAction::Decrement),
        Command::Message { text } => store.dispatch(CounterAction::SetMessage(text)),
        Command::Reset => store.dispatch(CounterAction::Reset),
        Command::Tick { count, interval_ms } => run_ticker(&store, count, interval_ms).await?,
    }

    let state = store.current_state();
    println!("{}", serde_json::to_string_pretty(&state)?);
    if let Some(error) = &state.last_error {
        eprintln!("Warning: {}", error);
    }
    Ok(())
}

async fn run_ticker(
    store: &Store<CounterReducer>,
    count: u32,
    interval_ms: u64,
) -> anyhow::Result<()> {
    let mut versions = store.subscribe();
    store.dispatch(CounterAction::StartTicking { count, interval_ms });

    let budget = interval_ms
        .saturating_mul(u64::from(count) + 1)
        .saturating_add(1_000);
    tokio::time::timeout(Duration::from_millis(budget), async {
        while store.with_state(|state| state.ticking) {
            if versions.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .context("Ticker did not finish in time")?;
    Ok(())
}
