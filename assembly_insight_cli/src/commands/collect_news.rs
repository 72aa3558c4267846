//! The `collect-news` subcommand.

use anyhow::Result;
use clap::Args;
use assembly_insight_lib::classify::{MarkupCleaner, TrustedSources};
use assembly_insight_lib::pipeline::collect_news;
use assembly_insight_lib::sources::NewsSearchSource;

use super::{finish_stage, Context};
use crate::config;
use crate::progress::BarProgress;

#[derive(Args)]
pub struct CollectNewsArgs {
    /// Articles requested per member (1-100)
    #[arg(long)]
    pub display: Option<u32>,

    /// Delay between searches in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

pub async fn run(args: &CollectNewsArgs, ctx: &Context) -> Result<()> {
    let mut fetch = ctx.settings.fetch.clone();
    if let Some(display) = args.display {
        fetch.news_display = display.clamp(1, 100);
    }
    if let Some(delay) = args.delay_ms {
        fetch.news_delay_ms = delay;
    }

    let source = NewsSearchSource::new(config::news_client()?, fetch.news_display);
    let trusted = TrustedSources::bundled()?;
    let cleaner = MarkupCleaner::new()?;
    let mut db = ctx.open_db()?;

    let progress = BarProgress::new("searching news");
    let report = collect_news(&mut db, &source, &trusted, &cleaner, &fetch, &progress).await?;
    finish_stage(&report, &ctx.format)
}
