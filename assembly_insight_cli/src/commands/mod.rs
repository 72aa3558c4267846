//! CLI subcommand implementations.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use assembly_insight_lib::{Db, RunReport, Settings};

use crate::output::{self, OutputFormat};

pub mod collect_bills;
pub mod collect_news;
pub mod export;
pub mod import_videos;
pub mod link_photos;
pub mod members;
pub mod stats;
pub mod summaries;
pub mod sync_members;
pub mod sync_sns;

/// Global options shared by every subcommand.
pub struct Context {
    pub db_path: PathBuf,
    pub settings: Settings,
    pub format: OutputFormat,
}

impl Context {
    /// Open the store and bring its schema up to date. An unopenable store
    /// is fatal for every command.
    pub fn open_db(&self) -> Result<Db> {
        let db = Db::open(&self.db_path)
            .with_context(|| format!("cannot open store {}", self.db_path.display()))?;
        db.init()?;
        Ok(db)
    }
}

/// Print a stage report and point at a stopped run.
pub fn finish_stage(report: &RunReport, format: &OutputFormat) -> Result<()> {
    output::print_report(report, format)?;
    if report.aborted {
        eprintln!(
            "{} stopped early after an upstream rate limit; re-run later to continue.",
            report.stage
        );
    }
    Ok(())
}
