//! The `import-videos` subcommand: merge video metadata from a JSON file.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Args;
use assembly_insight_lib::pipeline::import_videos;
use assembly_insight_lib::reconcile::VideoRecord;

use super::{finish_stage, Context};

#[derive(Args)]
pub struct ImportVideosArgs {
    /// JSON array of `{member_code, id|url, title, upload_date, duration, channel}`
    #[arg(long)]
    pub file: PathBuf,

    /// Shortest video kept, in seconds
    #[arg(long, default_value = "60")]
    pub min_duration: f64,
}

pub fn run(args: &ImportVideosArgs, ctx: &Context) -> Result<()> {
    if args.min_duration < 0.0 {
        bail!("--min-duration must be non-negative");
    }

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let videos: Vec<VideoRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of video records", args.file.display()))?;

    let mut db = ctx.open_db()?;
    let report = import_videos(&mut db, &videos, args.min_duration)?;
    finish_stage(&report, &ctx.format)
}
