//! The `stats` subcommand: legislative outcome statistics from stored bills.

use anyhow::{bail, Result};
use clap::Args;
use assembly_insight_lib::stats::compute_for_bills;

use super::Context;
use crate::output::{print_stats, MemberStats};

#[derive(Args)]
pub struct StatsArgs {
    /// Member code or name (partial match on name)
    #[arg(long)]
    pub member: Option<String>,
}

pub fn run(args: &StatsArgs, ctx: &Context) -> Result<()> {
    let db = ctx.open_db()?;
    let mut policies = db.query_policies()?;

    if let Some(ref needle) = args.member {
        policies.retain(|p| {
            p.member_code == *needle
                || p.member_name.as_deref().is_some_and(|n| n.contains(needle.as_str()))
        });
        if policies.is_empty() {
            bail!("No collected bills for a member matching '{}'", needle);
        }
    }

    let mut rows = Vec::with_capacity(policies.len());
    for policy in &policies {
        let bills = db.query_bills(&policy.member_code, None)?;
        rows.push(MemberStats {
            code: policy.member_code.clone(),
            name: policy
                .member_name
                .clone()
                .unwrap_or_else(|| policy.member_code.clone()),
            stats: compute_for_bills(&bills),
        });
    }

    print_stats(&rows, &ctx.format)
}
