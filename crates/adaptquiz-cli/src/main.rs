//! adaptquiz CLI — drive the adaptive assessment engine from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use adaptquiz_core::model::DifficultyLevel;

mod commands;

#[derive(Parser)]
#[command(name = "adaptquiz", version, about = "Adaptive assessment engine driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted answer sequence through the engine
    Simulate {
        /// Answers in order, C for correct and W for wrong (e.g. "CCWCW")
        #[arg(long)]
        answers: String,

        /// Time spent per answer in milliseconds (comma-separated)
        #[arg(long)]
        times: Option<String>,

        /// Starting difficulty: beginner, intermediate, advanced
        #[arg(long)]
        initial: Option<DifficultyLevel>,

        /// Session id sent to the behavior service
        #[arg(long)]
        session_id: Option<String>,

        /// JSON file of mid-quiz responses served by the offline behavior mock
        #[arg(long)]
        script: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the session report as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show historical mistake analysis and the remediation plan
    Mistakes {
        /// Look-back window in days (default: engine.mistake_window_days)
        #[arg(long)]
        days: Option<u32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "adaptquiz=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            answers,
            times,
            initial,
            session_id,
            script,
            config,
            output,
        } => {
            commands::simulate::execute(commands::simulate::SimulateArgs {
                answers,
                times,
                initial,
                session_id,
                script,
                config,
                output,
            })
            .await
        }
        Commands::Mistakes {
            days,
            config,
            format,
        } => commands::mistakes::execute(days, config, format).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
