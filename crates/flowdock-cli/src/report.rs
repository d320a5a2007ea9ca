//! Deploy counting by month
//!
//! Deploy notifications are mail events posted to a flow's team inbox and
//! tagged with the environment and application. Counting them per month from
//! one page of search results only works for months the page covers fully: if
//! the page is full, the oldest month is probably cut off and is dropped.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use flowdock_api_contract::Message;

/// Page size used by the deploy search
pub const PAGE_LIMIT: u32 = 100;

/// Messages carrying this tag are deploys to a staging copy of the environment
pub const PREPRODUCTION_TAG: &str = "preproduction";

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => write!(f, "{}", date.format("%Y-%b")),
            None => write!(f, "{}-{:02}", self.year, self.month),
        }
    }
}

/// Deploy totals for one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCount {
    pub app: String,
    /// Every counted deploy, including those in a dropped month
    pub total: usize,
    pub months: BTreeMap<Month, usize>,
    /// The page was full and the earliest month was dropped
    pub truncated: bool,
}

impl DeployCount {
    pub fn from_messages(app: impl Into<String>, messages: &[Message], limit: usize) -> Self {
        let mut total = 0;
        let mut months = BTreeMap::new();

        for message in messages.iter().filter(|m| !m.has_tag(PREPRODUCTION_TAG)) {
            total += 1;
            if let Some(sent) = &message.sent {
                let sent = sent.as_datetime();
                let month = Month {
                    year: sent.year(),
                    month: sent.month(),
                };
                *months.entry(month).or_insert(0) += 1;
            }
        }

        let truncated = messages.len() >= limit;
        if truncated {
            months.pop_first();
        }

        Self {
            app: app.into(),
            total,
            months,
            truncated,
        }
    }
}

impl fmt::Display for DeployCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Application: {}", self.app)?;
        writeln!(f)?;
        for (month, count) in &self.months {
            writeln!(f, "{month} {count}")?;
        }
        writeln!(f)?;
        write!(f, "  Total: {}", self.total)?;
        if self.truncated {
            write!(f, " (earliest month omitted, results hit the page limit)")?;
        }
        writeln!(f)
    }
}
