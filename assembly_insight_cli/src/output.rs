use anyhow::Result;
use serde::Serialize;
use assembly_insight_lib::stats::PolicyStats;
use assembly_insight_lib::store::MemberRow;
use assembly_insight_lib::summary::SummaryStatus;
use assembly_insight_lib::RunReport;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct MemberLine {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Party")]
    #[serde(rename = "Party")]
    party: String,
    #[tabled(rename = "District")]
    #[serde(rename = "District")]
    district: String,
    #[tabled(rename = "Terms")]
    #[serde(rename = "Terms")]
    times_elected: u32,
    #[tabled(rename = "Sitting")]
    #[serde(rename = "Sitting")]
    sitting: String,
}

/// Statistics for one member, as printed by `stats`.
#[derive(Debug, Clone, Serialize)]
pub struct MemberStats {
    pub code: String,
    pub name: String,
    pub stats: PolicyStats,
}

#[derive(Tabled, Serialize)]
struct StatsLine {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Bills")]
    #[serde(rename = "Bills")]
    total: u32,
    #[tabled(rename = "Passed")]
    #[serde(rename = "Passed")]
    passed: u32,
    #[tabled(rename = "Reflected")]
    #[serde(rename = "Reflected")]
    reflected: u32,
    #[tabled(rename = "Pending")]
    #[serde(rename = "Pending")]
    pending: u32,
    #[tabled(rename = "Failed")]
    #[serde(rename = "Failed")]
    failed: u32,
    #[tabled(rename = "Unclassified")]
    #[serde(rename = "Unclassified")]
    unclassified: u32,
    #[tabled(rename = "Achievement")]
    #[serde(rename = "Achievement")]
    achievement: String,
}

#[derive(Tabled, Serialize)]
struct SummaryLine {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Bills")]
    #[serde(rename = "Bills")]
    bills: i64,
    #[tabled(rename = "Summarized")]
    #[serde(rename = "Summarized")]
    summarized: String,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Stale")]
    #[serde(rename = "Stale")]
    stale: String,
}

#[derive(Tabled, Serialize)]
struct ReportLine {
    #[tabled(rename = "Stage")]
    #[serde(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Processed")]
    #[serde(rename = "Processed")]
    processed: usize,
    #[tabled(rename = "Inserted")]
    #[serde(rename = "Inserted")]
    inserted: usize,
    #[tabled(rename = "Updated")]
    #[serde(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Unchanged")]
    #[serde(rename = "Unchanged")]
    unchanged: usize,
    #[tabled(rename = "Links")]
    #[serde(rename = "Links")]
    relations_added: usize,
    #[tabled(rename = "Rejected")]
    #[serde(rename = "Rejected")]
    rejected: usize,
    #[tabled(rename = "Skipped")]
    #[serde(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Failed")]
    #[serde(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Requests")]
    #[serde(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Aborted")]
    #[serde(rename = "Aborted")]
    aborted: String,
}

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_string()
}

// -- Row builders --

fn build_member_lines(members: &[MemberRow]) -> Vec<MemberLine> {
    members
        .iter()
        .map(|m| MemberLine {
            code: m.code.clone(),
            name: m.name.clone(),
            party: m.party.clone(),
            district: m.district.clone(),
            times_elected: m.times_elected,
            sitting: yes_no(m.is_current),
        })
        .collect()
}

fn build_stats_lines(rows: &[MemberStats]) -> Vec<StatsLine> {
    rows.iter()
        .map(|r| StatsLine {
            name: r.name.clone(),
            total: r.stats.total,
            passed: r.stats.passed,
            reflected: r.stats.reflected,
            pending: r.stats.pending,
            failed: r.stats.failed,
            unclassified: r.stats.unclassified,
            achievement: format!("{:.1}%", r.stats.achievement_rate),
        })
        .collect()
}

fn build_summary_lines(statuses: &[SummaryStatus]) -> Vec<SummaryLine> {
    statuses
        .iter()
        .map(|s| SummaryLine {
            code: s.member_code.clone(),
            name: s.member_name.clone().unwrap_or_default(),
            bills: s.bill_count,
            summarized: s
                .summarized_bill_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            updated: s.summary_updated_at.clone().unwrap_or_else(|| "-".to_string()),
            stale: yes_no(s.stale),
        })
        .collect()
}

fn build_report_line(report: &RunReport) -> ReportLine {
    ReportLine {
        stage: report.stage.to_string(),
        processed: report.processed,
        inserted: report.inserted,
        updated: report.updated,
        unchanged: report.unchanged,
        relations_added: report.relations_added,
        rejected: report.rejected,
        skipped: report.skipped,
        failed: report.failed,
        requests: report.requests.made,
        aborted: yes_no(report.aborted),
    }
}

// -- Shared rendering --

fn print_lines<T: Tabled + Serialize>(lines: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(lines)),
        OutputFormat::Markdown => {
            let mut table = Table::new(lines);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for line in lines {
                wtr.serialize(line)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&lines),
    }
    Ok(())
}

pub fn print_members(members: &[MemberRow], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&members);
            Ok(())
        }
        _ => print_lines(&build_member_lines(members), format),
    }
}

pub fn print_stats(rows: &[MemberStats], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&rows);
            Ok(())
        }
        _ => print_lines(&build_stats_lines(rows), format),
    }
}

pub fn print_summaries(statuses: &[SummaryStatus], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&statuses);
            Ok(())
        }
        _ => print_lines(&build_summary_lines(statuses), format),
    }
}

pub fn print_report(report: &RunReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(report);
            Ok(())
        }
        _ => print_lines(&[build_report_line(report)], format),
    }
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
