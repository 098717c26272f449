//! orgqa CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use orgqa::{
    answer::AskRequest,
    commands::{
        cmd_ask, cmd_build, cmd_init, cmd_search, cmd_status, load_history, print_answer,
        print_build_stats, print_init_result, print_search_results, print_status, read_question,
        AskOptions, BuildOptions,
    },
    config::Config,
    embed::create_embedder,
    error::Result,
    progress::LogWriterFactory,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "orgqa")]
#[command(version, about = "Answer questions from an organization's site and FAQ", long_about = None)]
struct Cli {
    /// Path to config file (defaults to ./orgqa.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Chunk and embed the inputs, then write the index
    Build,

    /// Answer a question
    Ask {
        /// The question (read from stdin when omitted)
        question: Option<String>,

        /// JSON file with earlier [user, assistant] turns
        #[arg(long)]
        history: Option<PathBuf>,

        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show the chunks a question retrieves, with scores
    Search {
        /// The search query
        query: String,

        /// Number of chunks to retrieve
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show inputs, index and backend status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            let result = cmd_init(&path, force)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_init_result(&result);
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "orgqa", &mut std::io::stdout());
        }

        Commands::Build => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let embedder = create_embedder(&config.embedding)?;
            let options = BuildOptions {
                show_progress: !cli.json,
            };

            let stats = cmd_build(&config, embedder.as_ref(), options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_build_stats(&stats);
            }
        }

        Commands::Ask {
            question,
            history,
            k,
        } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let query = read_question(question)?;
            let history = match history {
                Some(path) => load_history(&path)?,
                None => Vec::new(),
            };

            let response =
                cmd_ask(&config, AskRequest { query, history }, AskOptions { k }).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_answer(&response);
            }
        }

        Commands::Search { query, k } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let results = cmd_search(&config, &query, k).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_search_results(&results);
            }
        }

        Commands::Status => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let status = cmd_status(&config)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}
