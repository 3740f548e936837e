use serde::Serialize;
use tracing::{debug, info, warn};

use crate::availability::{self, AcademicYearSpan, AvailabilityPeriod, DateInterval};
use crate::config::MalformedRowPolicy;
use crate::error::Result;
use crate::fetch::HtmlFetcher;
use crate::parser::dates::{self, DateFormat};
use crate::parser;
use crate::parser::table::{CalendarEvent, DEFAULT_ROW_SELECTOR};

/// How rows are read once they are off the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRules {
    pub format: DateFormat,
    /// Matched against the whole label, ignoring case.
    pub vacation_label: String,
    pub row_policy: MalformedRowPolicy,
}

impl Default for CalendarRules {
    fn default() -> Self {
        CalendarRules {
            format: DateFormat::default(),
            vacation_label: "vacation".to_string(),
            row_policy: MalformedRowPolicy::Skip,
        }
    }
}

/// All four views of the calendar, derived from a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarReport {
    pub events: Vec<(String, String)>,
    pub vacation_dates: Vec<String>,
    pub vacation_ranges: Vec<(String, String)>,
    pub available_periods: Vec<String>,
}

/// The rows of one fetch. Every query on it is pure.
#[derive(Debug, Clone)]
pub struct CalendarSnapshot {
    events: Vec<CalendarEvent>,
    rules: CalendarRules,
}

impl CalendarSnapshot {
    pub fn new(events: Vec<CalendarEvent>, rules: CalendarRules) -> Self {
        CalendarSnapshot { events, rules }
    }

    pub fn is_vacation(&self, event: &CalendarEvent) -> bool {
        event.label.to_lowercase() == self.rules.vacation_label.to_lowercase()
    }

    fn vacation_rows(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter().filter(|e| self.is_vacation(e))
    }

    /// Every row as `(label, date text)`, unfiltered.
    pub fn all_events(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .map(|e| (e.label.clone(), e.range_text.clone()))
            .collect()
    }

    /// Raw date text of each vacation row, unparsed.
    pub fn vacation_dates_only(&self) -> Vec<String> {
        self.vacation_rows().map(|e| e.range_text.clone()).collect()
    }

    /// Parsed vacation intervals in table order. Malformed rows follow the row policy.
    pub fn vacation_set(&self) -> Result<Vec<DateInterval>> {
        let mut set = Vec::new();
        for row in self.vacation_rows() {
            match dates::parse_range(&row.range_text, &self.rules.format) {
                Ok(interval) => {
                    debug!(label = %row.label, start = %interval.start, end = %interval.end, "vacation row");
                    set.push(interval);
                }
                Err(e) => match self.rules.row_policy {
                    MalformedRowPolicy::Skip => {
                        warn!(label = %row.label, error = %e, "Skipping malformed vacation row");
                    }
                    MalformedRowPolicy::Fail => return Err(e),
                },
            }
        }
        Ok(set)
    }

    /// Vacation ranges re-rendered as `(start, end)` in the calendar's date format.
    pub fn vacation_ranges(&self) -> Result<Vec<(String, String)>> {
        let format = &self.rules.format;
        Ok(self
            .vacation_set()?
            .iter()
            .map(|v| (dates::format_date(v.start, format), dates::format_date(v.end, format)))
            .collect())
    }

    /// Start of the first row to end of the last row, in document order.
    ///
    /// `None` when the table is empty. A malformed boundary row is always an error,
    /// whatever the row policy says.
    pub fn academic_year_span(&self) -> Result<Option<AcademicYearSpan>> {
        let (Some(first), Some(last)) = (self.events.first(), self.events.last()) else {
            return Ok(None);
        };
        let start = dates::parse_range(&first.range_text, &self.rules.format)?.start;
        let end = dates::parse_range(&last.range_text, &self.rules.format)?.end;
        Ok(Some(AcademicYearSpan { start, end }))
    }

    pub fn availability(&self) -> Result<Vec<AvailabilityPeriod>> {
        let Some(span) = self.academic_year_span()? else {
            return Ok(Vec::new());
        };
        let vacations = self.vacation_set()?;
        let periods = availability::complement(&span, &vacations);
        info!(
            "Academic year {} to {}: {} vacations, {} available periods ({} days)",
            span.start,
            span.end,
            vacations.len(),
            periods.len(),
            periods.iter().map(DateInterval::days).sum::<i64>()
        );
        Ok(periods)
    }

    /// Availability as `"<start> - <end>"` strings.
    pub fn available_periods(&self) -> Result<Vec<String>> {
        Ok(self
            .availability()?
            .iter()
            .map(|p| dates::format_range(p, &self.rules.format))
            .collect())
    }

    pub fn report(&self) -> Result<CalendarReport> {
        Ok(CalendarReport {
            events: self.all_events(),
            vacation_dates: self.vacation_dates_only(),
            vacation_ranges: self.vacation_ranges()?,
            available_periods: self.available_periods()?,
        })
    }
}

/// Fetches the calendar page and answers queries about it.
///
/// `snapshot` fetches once for any number of views. The per-query methods each
/// take their own snapshot and so hit the source every time.
pub struct CalendarService<F> {
    fetcher: F,
    url: String,
    row_selector: String,
    rules: CalendarRules,
}

impl<F: HtmlFetcher> CalendarService<F> {
    pub fn new(fetcher: F, url: &str, rules: CalendarRules) -> Self {
        CalendarService {
            fetcher,
            url: url.to_string(),
            row_selector: DEFAULT_ROW_SELECTOR.to_string(),
            rules,
        }
    }

    pub fn with_row_selector(mut self, selector: &str) -> Self {
        self.row_selector = selector.to_string();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn snapshot(&self) -> Result<CalendarSnapshot> {
        let html = self.fetcher.fetch(&self.url).await?;
        let events = parser::extract_events(&html, &self.row_selector)?;
        info!("Extracted {} calendar rows", events.len());
        Ok(CalendarSnapshot::new(events, self.rules.clone()))
    }

    pub async fn all_events(&self) -> Result<Vec<(String, String)>> {
        Ok(self.snapshot().await?.all_events())
    }

    pub async fn vacation_dates_only(&self) -> Result<Vec<String>> {
        Ok(self.snapshot().await?.vacation_dates_only())
    }

    pub async fn vacation_ranges(&self) -> Result<Vec<(String, String)>> {
        self.snapshot().await?.vacation_ranges()
    }

    pub async fn available_periods(&self) -> Result<Vec<String>> {
        self.snapshot().await?.available_periods()
    }

    pub async fn report(&self) -> Result<CalendarReport> {
        self.snapshot().await?.report()
    }
}

// ── Tests ──
