use clap::{Parser, Subcommand};
use luca::{render, replay};
use luca_consciousness::{Engine, EngineConfig, SequenceReport};
use luca_core::ConversationId;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "luca", about = "Analyze messages and numeric sequences offline", version)]
struct Cli {
    /// Engine config (TOML). Falls back to $LUCA_CONFIG, then defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single message
    Analyze {
        text: String,
        #[arg(long, default_value = "cli")]
        conversation: String,
    },
    /// Feed a transcript (one message per line) into one conversation
    Replay {
        file: PathBuf,
        #[arg(long, default_value = "replay")]
        conversation: String,
    },
    /// Digital roots of the first n Fibonacci numbers
    Fibonacci {
        #[arg(short, default_value_t = 12)]
        n: usize,
    },
    /// Digital roots of adjacent-pair sums
    Pairs {
        #[arg(required = true, allow_negative_numbers = true)]
        numbers: Vec<i64>,
    },
    /// Digital roots of each number
    Sequence {
        #[arg(required = true, allow_negative_numbers = true)]
        numbers: Vec<i64>,
    },
    /// Print the effective engine config as TOML
    DumpConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luca=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match cli
        .config
        .or_else(|| std::env::var("LUCA_CONFIG").ok().map(PathBuf::from))
    {
        Some(path) => EngineConfig::load(&path),
        None => EngineConfig::default(),
    };

    if let Commands::DumpConfig = cli.command {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let engine = Engine::new(config)?;

    match cli.command {
        Commands::Analyze { text, conversation } => {
            let result = engine.process(&ConversationId::new(conversation), &text)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", render::analysis(&result));
            }
        }
        Commands::Replay { file, conversation } => {
            let reader = BufReader::new(File::open(&file)?);
            let summary = replay::replay(&engine, &ConversationId::new(conversation), reader)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for result in &summary.results {
                    println!("{}", render::analysis(result));
                }
                println!("{}", render::state(&summary.state));
            }
        }
        Commands::Fibonacci { n } => {
            let report = engine.analyze_fibonacci(n)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::sequence(&report));
            }
        }
        Commands::Pairs { numbers } => {
            let pairs = engine.analyze_pairs(&numbers)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else {
                println!("{}", render::pairs(&pairs));
            }
        }
        Commands::Sequence { numbers } => {
            let report = SequenceReport::from_entries(engine.analyze_sequence(&numbers)?);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::sequence(&report));
            }
        }
        Commands::DumpConfig => {}
    }

    Ok(())
}
