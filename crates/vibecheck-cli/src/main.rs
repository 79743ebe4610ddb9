use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vibecheck_sentiment::AnalysisMode;

mod run;

#[derive(Debug, Parser)]
#[command(name = "vibecheck")]
#[command(about = "Sentiment reports for Reddit and X threads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// One backend call per text
    Single,
    /// One backend call per batch of texts
    Batch,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => AnalysisMode::Single,
            ModeArg::Batch => AnalysisMode::Batch,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze the given Reddit or X URLs
    Analyze {
        /// URLs to analyze; prompts on stdin when none are given
        urls: Vec<String>,

        /// Read additional URLs from a file, one per line (`#` starts a comment)
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ModeArg::Single)]
        mode: ModeArg,

        /// Override VIBECHECK_BATCH_SIZE for batch mode
        #[arg(long)]
        batch_size: Option<NonZeroUsize>,

        /// Validate URLs and print the plan without calling the backend or writing files
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the daily report over the built-in trending seeds
    Daily {
        #[arg(long, value_enum, default_value_t = ModeArg::Batch)]
        mode: ModeArg,

        /// Validate seeds and print the plan without calling the backend or writing files
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the built-in trending seed URLs
    Seeds,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = vibecheck_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Analyze {
            urls,
            file,
            mode,
            batch_size,
            dry_run,
        } => {
            let urls = run::collect_urls(urls, file.as_deref()).await?;
            let plan = run::RunPlan {
                urls,
                mode: mode.into(),
                batch_size: batch_size.map(NonZeroUsize::get),
                dry_run,
            };
            run::execute(&config, plan).await?;
        }
        Commands::Daily { mode, dry_run } => {
            let plan = run::RunPlan {
                urls: run::seed_urls(),
                mode: mode.into(),
                batch_size: None,
                dry_run,
            };
            run::execute(&config, plan).await?;
        }
        Commands::Seeds => {
            for url in run::seed_urls() {
                println!("{url}");
            }
        }
    }

    Ok(())
}
