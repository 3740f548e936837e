mod availability;
mod calendar;
mod config;
mod error;
mod fetch;
mod parser;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::calendar::{CalendarReport, CalendarService};
use crate::config::{MalformedRowPolicy, Settings};
use crate::error::CalendarError;
use crate::fetch::{FileFetcher, HtmlFetcher, HttpFetcher, SingleFlight};

#[derive(Parser)]
#[command(
    name = "academic_calendar",
    about = "Vacation and teaching periods from a published academic calendar"
)]
struct Cli {
    /// Calendar page to scrape (default: CALENDAR_SOURCE_URL or the built-in page)
    #[arg(long, global = true)]
    url: Option<String>,
    /// Read the calendar HTML from a local file instead of fetching it
    #[arg(long, global = true, conflicts_with = "url")]
    file: Option<PathBuf>,
    /// Print JSON instead of plain lines
    #[arg(long, global = true)]
    json: bool,
    /// Fail on the first malformed vacation row instead of skipping it
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Every row of the events table
    Events,
    /// Raw date text of the vacation rows
    Vacations,
    /// Vacation rows as (start, end) pairs
    VacationRanges,
    /// Teaching periods left once vacations are taken out
    Available,
    /// All of the above from a single fetch
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if cli.strict {
        settings.row_policy = MalformedRowPolicy::Fail;
    }
    let rules = settings.rules()?;

    let result = match &cli.file {
        Some(path) => {
            let source = path.to_string_lossy();
            let service = CalendarService::new(FileFetcher, &source, rules)
                .with_row_selector(&settings.row_selector);
            run(&service, &cli.command, cli.json).await
        }
        None => {
            let url = cli.url.as_deref().unwrap_or(&settings.source_url);
            let fetcher = HttpFetcher::new(settings.timeout(), &settings.user_agent)?;
            let service = CalendarService::new(SingleFlight::new(fetcher), url, rules)
                .with_row_selector(&settings.row_selector);
            run(&service, &cli.command, cli.json).await
        }
    };

    tracing::debug!("Finished in {:.2}s", t0.elapsed().as_secs_f64());

    if let Err(e) = &result {
        if let Some(cal) = e.downcast_ref::<CalendarError>() {
            eprintln!("error[{}]: {}", cal.code(), cal);
            std::process::exit(1);
        }
    }
    result
}

async fn run<F: HtmlFetcher>(
    service: &CalendarService<F>,
    command: &Commands,
    json: bool,
) -> anyhow::Result<()> {
    let source = service.url();
    match command {
        Commands::Events => {
            let events = service.all_events().await?;
            emit(json, &events, || {
                for (label, range) in &events {
                    println!("{:<40} {}", truncate(label, 40), range);
                }
                println!("\n{} rows from {}", events.len(), source);
            })
        }
        Commands::Vacations => {
            let dates = service.vacation_dates_only().await?;
            emit(json, &dates, || {
                for d in &dates {
                    println!("{}", d);
                }
            })
        }
        Commands::VacationRanges => {
            let ranges = service.vacation_ranges().await?;
            emit(json, &ranges, || {
                for (start, end) in &ranges {
                    println!("{:>12}  ->  {}", start, end);
                }
            })
        }
        Commands::Available => {
            let periods = service.available_periods().await?;
            emit(json, &periods, || {
                if periods.is_empty() {
                    println!("No available periods found on {}", source);
                }
                for p in &periods {
                    println!("{}", p);
                }
            })
        }
        Commands::Report => {
            let report = service.report().await?;
            emit(json, &report, || print_report(&report))
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value).context("Failed to encode JSON")?;
        println!("{}", out);
    } else {
        text();
    }
    Ok(())
}

fn print_report(report: &CalendarReport) {
    println!("--- Events ({}) ---", report.events.len());
    for (label, range) in &report.events {
        println!("  {:<40} {}", truncate(label, 40), range);
    }

    println!("\n--- Vacations ({}) ---", report.vacation_ranges.len());
    for (start, end) in &report.vacation_ranges {
        println!("  {} - {}", start, end);
    }
    let skipped = report.vacation_dates.len().saturating_sub(report.vacation_ranges.len());
    if skipped > 0 {
        println!("  ({} vacation rows skipped, see warnings)", skipped);
    }

    println!("\n--- Available ({}) ---", report.available_periods.len());
    for p in &report.available_periods {
        println!("  {}", p);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──
