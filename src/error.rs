use thiserror::Error;

/// Everything that can go wrong while turning the calendar page into periods.
///
/// Cloneable so a single in-flight fetch can hand the same failure to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("failed to scrape academic dates from {url}: {reason}")]
    ScrapeFailure { url: String, reason: String },

    #[error("malformed date range {text:?}: {reason}")]
    MalformedDateRange { text: String, reason: String },

    #[error("failed to scrape academic dates: invalid row selector {0:?}")]
    InvalidSelector(String),
}

impl CalendarError {
    pub fn scrape(url: &str, reason: impl ToString) -> Self {
        CalendarError::ScrapeFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(text: &str, reason: impl ToString) -> Self {
        CalendarError::MalformedDateRange {
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code, distinguishing fetch problems from bad data.
    pub fn code(&self) -> &'static str {
        match self {
            CalendarError::ScrapeFailure { .. } | CalendarError::InvalidSelector(_) => {
                "scrape_failure"
            }
            CalendarError::MalformedDateRange { .. } => "malformed_date_range",
        }
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_split_fetch_from_parse() {
        assert_eq!(CalendarError::scrape("http://x", "boom").code(), "scrape_failure");
        assert_eq!(CalendarError::InvalidSelector("[".into()).code(), "scrape_failure");
        assert_eq!(
            CalendarError::malformed("1 Jan 2025", "missing separator").code(),
            "malformed_date_range"
        );
    }

    #[test]
    fn scrape_message_keeps_generic_prefix() {
        let msg = CalendarError::scrape("http://x", "timed out").to_string();
        assert!(msg.starts_with("failed to scrape academic dates"));
        assert!(msg.contains("timed out"));
    }
}
