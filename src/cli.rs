//! Command-line interface definitions for the news scrap tool.

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

/// How the finished result list is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Group records by category.
    Category,
    /// File every record under one scrap section.
    Scrap,
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Today's coverage of the default keyword
/// news_scrap
///
/// # Two terms, the first ranked ahead, with a JSON copy of the results
/// news_scrap -k 서울교통공사 -k 서울지하철 --priority 서울교통공사=0 --priority 서울지하철=1 -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search term; repeat for several terms
    #[arg(short, long = "keyword", default_value = "서울교통공사")]
    pub keywords: Vec<String>,

    /// First day of the range (YYYY-MM-DD), defaults to yesterday
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Upper bound on returned articles
    #[arg(short = 'n', long, default_value_t = 30)]
    pub max_articles: usize,

    /// Term rank as TERM=RANK; lower ranks are listed first
    #[arg(long = "priority", value_parser = parse_priority)]
    pub priorities: Vec<(String, i32)>,

    /// Keep articles only reachable through the publisher's own site
    #[arg(long)]
    pub include_external: bool,

    /// Report layout printed to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Category)]
    pub format: ReportFormat,

    /// Scrap section used with `--format scrap`
    #[arg(long, default_value = "공사 관련 보도")]
    pub section: String,

    /// Optional output directory for a JSON copy of the results
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,
}

fn parse_priority(s: &str) -> Result<(String, i32), String> {
    let (term, rank) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TERM=RANK, got `{s}`"))?;
    let term = term.trim();
    if term.is_empty() {
        return Err(format!("empty term in `{s}`"));
    }
    let rank = rank
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid rank in `{s}`: {e}"))?;
    Ok((term.to_string(), rank))
}
