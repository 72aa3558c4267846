//! The `export` subcommand: write dashboard snapshots.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use assembly_insight_lib::{Exporter, KeywordExtractor, SimpleTokenizer};

use super::Context;
use crate::output::print_json;

#[derive(Args)]
pub struct ExportArgs {
    /// Directory receiving `members_all.json` and `<code>.json` files
    #[arg(long, default_value = "data_export")]
    pub out_dir: PathBuf,
}

pub fn run(args: &ExportArgs, ctx: &Context) -> Result<()> {
    let keywords = &ctx.settings.keywords;
    let extractor =
        KeywordExtractor::with_bundled_stopwords(SimpleTokenizer, keywords.title_weight, keywords.top_k)?;
    let db = ctx.open_db()?;

    let now = Local::now();
    let now = now.with_timezone(now.offset());

    let exporter = Exporter::new(&db, &extractor, &ctx.settings);
    let report = exporter.export_all(&args.out_dir, now)?;

    if matches!(ctx.format, crate::output::OutputFormat::Json) {
        print_json(&report);
    }
    eprintln!(
        "Exported {} member snapshot(s) to {} ({} failed)",
        report.written,
        args.out_dir.display(),
        report.failed
    );
    Ok(())
}
