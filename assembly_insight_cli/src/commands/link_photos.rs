//! The `link-photos` subcommand.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use assembly_insight_lib::pipeline::link_photos;

use super::{finish_stage, Context};

#[derive(Args)]
pub struct LinkPhotosArgs {
    /// Directory holding `{name}_{code}_300.jpg` thumbnails
    #[arg(long)]
    pub dir: PathBuf,

    /// Path prefix stored in front of each file name
    #[arg(long, default_value = "/images/members")]
    pub web_prefix: String,
}

pub fn run(args: &LinkPhotosArgs, ctx: &Context) -> Result<()> {
    if !args.dir.is_dir() {
        bail!("{} is not a directory", args.dir.display());
    }
    let mut db = ctx.open_db()?;
    let report = link_photos(&mut db, &args.dir, &args.web_prefix)?;
    finish_stage(&report, &ctx.format)
}
