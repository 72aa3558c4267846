//! The `summaries` subcommand: report which policy summaries need a rerun.
//! Read-only; regeneration goes through `summary::refresh_summaries` with a
//! `Summarizer` implementation.

use anyhow::Result;
use clap::Args;
use assembly_insight_lib::summary::summary_status;

use super::Context;
use crate::output::print_summaries;

#[derive(Args)]
pub struct SummariesArgs {
    /// Only list members whose summary is missing or out of date
    #[arg(long)]
    pub stale_only: bool,
}

pub fn run(args: &SummariesArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;
    let mut statuses = summary_status(&db)?;
    if args.stale_only {
        statuses.retain(|s| s.stale);
    }

    let stale = statuses.iter().filter(|s| s.stale).count();
    print_summaries(&statuses, &ctx.format)?;
    eprintln!("{} of {} summaries need regeneration", stale, statuses.len());
    Ok(())
}
