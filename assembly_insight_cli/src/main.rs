mod commands;
mod config;
mod output;
mod progress;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use assembly_insight_lib::Settings;

use crate::commands::Context;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "assembly-insight")]
#[command(about = "Reconcile and analyse National Assembly member activity")]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "assembly_insight.db", global = true)]
    db: PathBuf,

    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML file overriding the default policy settings
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the full roster and merge member profiles
    SyncMembers(commands::sync_members::SyncMembersArgs),
    /// Attach SNS links and mark sitting members
    SyncSns(commands::sync_sns::SyncSnsArgs),
    /// Search news for sitting members and link trusted articles
    CollectNews(commands::collect_news::CollectNewsArgs),
    /// Merge video metadata produced by an external extractor
    ImportVideos(commands::import_videos::ImportVideosArgs),
    /// Replace each sitting member's lead-sponsored bills
    CollectBills(commands::collect_bills::CollectBillsArgs),
    /// Point member photos at thumbnails on disk
    LinkPhotos(commands::link_photos::LinkPhotosArgs),
    /// Report policy summary freshness without regenerating summaries
    ///
    /// Compares each member's bill count with the count its stored summary
    /// was written for. This command never generates summaries, so exported
    /// policy summaries stay empty until a summarizer has filled them in.
    Summaries(commands::summaries::SummariesArgs),
    /// List members from the store
    Members(commands::members::MembersArgs),
    /// Legislative outcome statistics per member
    Stats(commands::stats::StatsArgs),
    /// Write per-member JSON snapshots for the dashboard
    Export(commands::export::ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("assembly_insight=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let ctx = Context {
        db_path: cli.db,
        settings,
        format,
    };

    match &cli.command {
        Commands::SyncMembers(args) => commands::sync_members::run(args, &ctx).await?,
        Commands::SyncSns(args) => commands::sync_sns::run(args, &ctx).await?,
        Commands::CollectNews(args) => commands::collect_news::run(args, &ctx).await?,
        Commands::ImportVideos(args) => commands::import_videos::run(args, &ctx)?,
        Commands::CollectBills(args) => commands::collect_bills::run(args, &ctx).await?,
        Commands::LinkPhotos(args) => commands::link_photos::run(args, &ctx)?,
        Commands::Summaries(args) => commands::summaries::run(args, &ctx)?,
        Commands::Members(args) => commands::members::run(args, &ctx)?,
        Commands::Stats(args) => commands::stats::run(args, &ctx)?,
        Commands::Export(args) => commands::export::run(args, &ctx)?,
    }

    Ok(())
}
