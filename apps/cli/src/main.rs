mod commands;

use clap::{Parser, Subcommand};
use postfeed::{CONFIG_FILE, OutputMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "postfeed")]
#[command(about = "Generates feeds and category pages from Markdown posts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file into the current directory
    Init {
        #[arg(long, short, default_value = CONFIG_FILE)]
        config: PathBuf,
    },
    /// Generate every feed and category page
    Build {
        #[arg(long, short, default_value = CONFIG_FILE)]
        config: PathBuf,

        #[arg(long, short)]
        posts: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long, short)]
        mode: Option<OutputMode>,

        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { config } => commands::init_config(&config),
        Commands::Build {
            config,
            posts,
            output,
            mode,
            base_url,
        } => commands::build_feeds(
            &config,
            commands::Overrides {
                posts,
                output,
                mode,
                base_url,
            },
        ),
    };

    if let Err(error) = result {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
