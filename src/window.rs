//! Selection of the samples around an animal's event date

use crate::error::WindowError;
use crate::time_series::TimeSeries;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const NULL_MARKERS: &[&str] = &["", "nat", "nan", "null", "none"];

/// Event date of an animal as delivered by the data loader
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventDate {
    /// No date was recorded
    #[default]
    Missing,
    /// Date text, parsed on use
    Text(String),
    Timestamp(NaiveDateTime),
}

impl EventDate {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Resolve to a timestamp, date-only values resolve to midnight
    pub fn resolve(&self) -> Result<NaiveDateTime, WindowError> {
        match self {
            Self::Missing => Err(WindowError::invalid_event_date("event date is missing")),
            Self::Timestamp(t) => Ok(*t),
            Self::Text(s) => parse_event_date(s),
        }
    }
}

impl From<NaiveDateTime> for EventDate {
    fn from(t: NaiveDateTime) -> Self {
        Self::Timestamp(t)
    }
}

impl From<NaiveDate> for EventDate {
    fn from(d: NaiveDate) -> Self {
        Self::Timestamp(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl<T: Into<EventDate>> From<Option<T>> for EventDate {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Missing, Into::into)
    }
}

fn parse_event_date(s: &str) -> Result<NaiveDateTime, WindowError> {
    let s = s.trim();
    if NULL_MARKERS.iter().any(|marker| s.eq_ignore_ascii_case(marker)) {
        return Err(WindowError::invalid_event_date(format!(
            "event date {s:?} is a null value"
        )));
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .ok_or_else(|| {
            WindowError::invalid_event_date(format!("cannot convert {s:?} to a calendar date"))
        })
}

/// Interval around the event date, in whole days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct WindowSpan {
    pub days_before: u32,
    pub days_after: u32,
}

impl WindowSpan {
    pub fn new(days_before: u32, days_after: u32) -> Self {
        Self {
            days_before,
            days_after,
        }
    }

    /// Inclusive `[event - days_before, event + days_after]` interval
    ///
    /// Fails if either end is outside of the calendar range representable by [NaiveDateTime].
    pub fn bounds(
        &self,
        event: NaiveDateTime,
    ) -> Result<(NaiveDateTime, NaiveDateTime), WindowError> {
        let start = event.checked_sub_signed(TimeDelta::days(self.days_before.into()));
        let end = event.checked_add_signed(TimeDelta::days(self.days_after.into()));
        start.zip(end).ok_or(WindowError::SpanOutOfRange {
            event,
            days_before: self.days_before,
            days_after: self.days_after,
        })
    }

    #[inline]
    pub fn default_before() -> Self {
        Self::new(6, 0)
    }

    #[inline]
    pub fn default_after() -> Self {
        Self::new(0, 6)
    }
}

/// Analysis window label
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisWindow {
    Before,
    After,
}

impl AnalysisWindow {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which windows a cohort analysis evaluates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    Before,
    After,
    #[default]
    Both,
}

impl WindowMode {
    /// Windows to evaluate, `Both` expands into two independent windows
    pub fn windows(&self) -> &'static [AnalysisWindow] {
        match self {
            Self::Before => &[AnalysisWindow::Before],
            Self::After => &[AnalysisWindow::After],
            Self::Both => &[AnalysisWindow::Before, AnalysisWindow::After],
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown window mode {0:?}, expected one of \"before\", \"after\", \"both\"")]
pub struct ParseWindowModeError(String);

impl FromStr for WindowMode {
    type Err = ParseWindowModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "both" => Ok(Self::Both),
            _ => Err(ParseWindowModeError(s.to_owned())),
        }
    }
}

/// Samples of `series` within `span` around `event_date`, boundaries included
///
/// Missing or unparsable event date is an error, so is a span reaching out of the calendar
/// range. No samples in the interval gives an empty series, which means that the window cannot
/// be fitted.
pub fn select(
    series: &TimeSeries,
    event_date: &EventDate,
    span: WindowSpan,
) -> Result<TimeSeries, WindowError> {
    let event = event_date.resolve()?;
    let (start, end) = span.bounds(event)?;
    Ok(series.slice_between(start, end))
}
