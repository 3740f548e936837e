pub mod dates;
pub mod table;

use scraper::Html;

use crate::error::Result;
use table::CalendarEvent;

/// HTML → events. The lazy row walk is drained here so the parsed document
/// never outlives one call.
pub fn extract_events(html: &str, row_selector: &str) -> Result<Vec<CalendarEvent>> {
    let rows = table::row_selector(row_selector)?;
    let doc = Html::parse_document(html);
    Ok(table::events(&doc, &rows).collect())
}
