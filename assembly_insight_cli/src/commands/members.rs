use anyhow::{bail, Result};
use clap::Args;
use assembly_insight_lib::store::MemberFilter;

use super::Context;
use crate::output::print_members;

#[derive(Args)]
pub struct MembersArgs {
    /// Search by member name (partial match)
    #[arg(long)]
    pub name: Option<String>,

    /// Filter by party (exact match)
    #[arg(long)]
    pub party: Option<String>,

    /// Include former members
    #[arg(long)]
    pub all: bool,

    /// Maximum rows to print
    #[arg(long)]
    pub limit: Option<i64>,
}

pub fn run(args: &MembersArgs, ctx: &Context) -> Result<()> {
    if matches!(args.limit, Some(n) if n <= 0) {
        bail!("--limit must be a positive integer");
    }

    let db = ctx.open_db()?;
    let members = db.query_members(&MemberFilter {
        current_only: !args.all,
        name: args.name.clone(),
        party: args.party.clone(),
        limit: args.limit,
    })?;

    if members.is_empty() {
        eprintln!("No members found. Run 'assembly-insight sync-members' and 'sync-sns' first.");
        return Ok(());
    }
    print_members(&members, &ctx.format)
}
