//! The `collect-bills` subcommand.

use anyhow::Result;
use clap::Args;
use assembly_insight_lib::pipeline::collect_bills;
use assembly_insight_lib::sources::PortalSource;

use super::{finish_stage, Context};
use crate::config;
use crate::progress::BarProgress;

#[derive(Args)]
pub struct CollectBillsArgs {
    /// Assembly term whose bills are collected
    #[arg(long)]
    pub term: Option<u32>,

    /// Delay between bill requests in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

pub async fn run(args: &CollectBillsArgs, ctx: &Context) -> Result<()> {
    let mut fetch = ctx.settings.fetch.clone();
    if let Some(term) = args.term {
        fetch.assembly_term = term;
    }
    if let Some(delay) = args.delay_ms {
        fetch.bill_delay_ms = delay;
    }

    let source = PortalSource::new(config::portal_client()?, fetch.assembly_term);
    let mut db = ctx.open_db()?;

    let progress = BarProgress::new("collecting bills");
    let report = collect_bills(&mut db, &source, &fetch, &progress).await?;
    finish_stage(&report, &ctx.format)
}
