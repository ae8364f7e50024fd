//! import-rankings - load translation-recommendation predictions
//!
//! ```text
//! import-rankings --load languages --tsv languages.tsv
//! import-rankings --load scores --source en --target uz --tsv en-uz.tsv
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wkrec_se::import::{load_languages, load_scores, parse_languages, parse_scores};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Load {
    Languages,
    Scores,
}

#[derive(Parser, Debug)]
#[command(name = "import-rankings")]
#[command(about = "Imports article recommendation rankings into the ranking store")]
#[command(version)]
struct Args {
    /// What the TSV file contains
    #[arg(long, value_enum)]
    load: Load,

    /// TSV file to import
    #[arg(long)]
    tsv: PathBuf,

    /// Source language (scores only)
    #[arg(long)]
    source: Option<String>,

    /// Target language (scores only)
    #[arg(long)]
    target: Option<String>,

    /// Ranking store URL
    #[arg(long, env = "WKREC_DATABASE_URL", default_value = "sqlite://recommendations.db")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let text = std::fs::read_to_string(&args.tsv)
        .with_context(|| format!("Failed to read {}", args.tsv.display()))?;
    let pool = wkrec_se::db::connect_writable(&args.database_url).await?;

    match args.load {
        Load::Languages => {
            let codes = parse_languages(&text);
            load_languages(&pool, &codes).await?;
        }
        Load::Scores => {
            let (Some(source), Some(target)) = (args.source.as_deref(), args.target.as_deref()) else {
                bail!("--load scores requires --source and --target");
            };
            let rows = parse_scores(&text)?;
            load_scores(&pool, source, target, &rows).await?;
        }
    }

    pool.close().await;
    info!("Import complete");
    Ok(())
}
