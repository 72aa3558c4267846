//! The `sync-members` subcommand: page through the roster and merge profiles.

use anyhow::Result;
use clap::Args;
use assembly_insight_lib::pipeline::sync_members;
use assembly_insight_lib::sources::PortalSource;

use super::{finish_stage, Context};
use crate::config;

#[derive(Args)]
pub struct SyncMembersArgs {
    /// Rows per roster page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u32>,
}

pub async fn run(args: &SyncMembersArgs, ctx: &Context) -> Result<()> {
    let mut fetch = ctx.settings.fetch.clone();
    if let Some(size) = args.page_size {
        fetch.page_size = size.clamp(1, 1000);
    }
    if let Some(pages) = args.max_pages {
        fetch.max_pages = pages.max(1);
    }

    let source = PortalSource::new(config::portal_client()?, fetch.assembly_term);
    let mut db = ctx.open_db()?;

    eprintln!("Syncing roster into {}", ctx.db_path.display());
    let report = sync_members(&mut db, &source, &fetch).await?;
    finish_stage(&report, &ctx.format)
}
