use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::error::{CalendarError, Result};

/// Rows of every events table body on the page.
pub const DEFAULT_ROW_SELECTOR: &str = "table tbody tr";

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// One table row: what happens, and the raw date cell next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub label: String,
    pub range_text: String,
}

pub fn row_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| CalendarError::InvalidSelector(css.to_string()))
}

/// Walk matching rows in document order, yielding rows with a non-empty label and date cell.
pub fn events<'a>(doc: &'a Html, rows: &'a Selector) -> impl Iterator<Item = CalendarEvent> + 'a {
    doc.select(rows).filter_map(row_to_event)
}

fn row_to_event(row: ElementRef) -> Option<CalendarEvent> {
    let mut cells = row.select(&CELL_SELECTOR);
    let label = normalize_ws(&cell_text(cells.next()?));
    let range_text = cell_text(cells.next()?).trim().to_string();

    if label.is_empty() || range_text.is_empty() {
        return None;
    }
    Some(CalendarEvent { label, range_text })
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect()
}

/// Collapse whitespace runs to one space and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<CalendarEvent> {
        let doc = Html::parse_document(html);
        let rows = row_selector(DEFAULT_ROW_SELECTOR).unwrap();
        events(&doc, &rows).collect()
    }

    fn pairs(events: &[CalendarEvent]) -> Vec<(&str, &str)> {
        events
            .iter()
            .map(|e| (e.label.as_str(), e.range_text.as_str()))
            .collect()
    }

    #[test]
    fn fixture_rows_in_document_order() {
        let html = std::fs::read_to_string("tests/fixtures/academic_calendar.html").unwrap();
        let events = extract(&html);
        assert_eq!(events.len(), 9);
        assert_eq!(
            pairs(&events[..3]),
            vec![
                ("Semester 1 Term 1", "21 Apr 2025 - 1 Jun 2025"),
                ("Vacation", "2 Jun 2025 - 8 Jun 2025"),
                ("Semester 1 Term 2", "9 Jun 2025 - 17 Aug 2025"),
            ]
        );
        assert_eq!(events.last().unwrap().range_text, "5 Jan 2026 - 18 Apr 2026");
    }

    #[test]
    fn header_rows_are_not_events() {
        let html = std::fs::read_to_string("tests/fixtures/academic_calendar.html").unwrap();
        assert!(extract(&html).iter().all(|e| e.label != "Event"));
    }

    #[test]
    fn label_whitespace_collapsed() {
        let events = extract(
            "<table><tbody><tr><td>  Semester\n\t 2   Term 1 </td><td>  20 Oct 2025 - 14 Dec 2025\n</td></tr></tbody></table>",
        );
        assert_eq!(pairs(&events), vec![("Semester 2 Term 1", "20 Oct 2025 - 14 Dec 2025")]);
    }

    #[test]
    fn incomplete_rows_skipped() {
        let events = extract(
            "<table><tbody>\
             <tr><td>Only a label</td></tr>\
             <tr><td>   </td><td>1 Jan 2025 - 2 Jan 2025</td></tr>\
             <tr><td>No date</td><td> </td></tr>\
             <tr></tr>\
             <tr><td>Kept</td><td>3 Jan 2025 - 4 Jan 2025</td></tr>\
             </tbody></table>",
        );
        assert_eq!(pairs(&events), vec![("Kept", "3 Jan 2025 - 4 Jan 2025")]);
    }

    #[test]
    fn nested_markup_contributes_text() {
        let events = extract(
            "<table><tbody><tr><td><strong>Vacation</strong> <em>(all)</em></td><td><span>1 Jun 2025</span> - <span>14 Jun 2025</span></td></tr></tbody></table>",
        );
        assert_eq!(pairs(&events), vec![("Vacation (all)", "1 Jun 2025 - 14 Jun 2025")]);
    }

    #[test]
    fn page_without_table_yields_nothing() {
        assert!(extract("<html><body><p>Calendar moved</p></body></html>").is_empty());
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = row_selector("table >>> tr[").unwrap_err();
        assert_eq!(err.code(), "scrape_failure");
    }
}
