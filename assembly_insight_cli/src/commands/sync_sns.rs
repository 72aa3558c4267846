//! The `sync-sns` subcommand: attach SNS links to known members.

use anyhow::Result;
use clap::Args;
use assembly_insight_lib::pipeline::sync_sns;
use assembly_insight_lib::sources::PortalSource;

use super::{finish_stage, Context};
use crate::config;

#[derive(Args)]
pub struct SyncSnsArgs {}

pub async fn run(_args: &SyncSnsArgs, ctx: &Context) -> Result<()> {
    let fetch = &ctx.settings.fetch;
    let source = PortalSource::new(config::portal_client()?, fetch.assembly_term);
    let mut db = ctx.open_db()?;

    let report = sync_sns(&mut db, &source, fetch).await?;
    if report.skipped > 0 {
        eprintln!(
            "{} SNS rows named members not in the store; run sync-members first.",
            report.skipped
        );
    }
    finish_stage(&report, &ctx.format)
}
