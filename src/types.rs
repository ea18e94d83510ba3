//! Core query types shared across the crate
//!
//! # Key Types
//!
//! - **`Period`**: Granularity of an archive (day, week, month, year, range)
//! - **`DateSelector`**: The date part of a query (single date, range, last N, previous N)
//! - **`SiteSelector`**: One site, a list of sites, or all sites
//! - **`PeriodSpan`**: A resolved period attached to a fetched table
//!
//! # Example
//!
//! ```rust
//! use kuba_report_search::types::{DateSelector, Period, SiteSelector};
//!
//! let period: Period = "day".parse().unwrap();
//! let date: DateSelector = "2024-03-01,2024-03-07".parse().unwrap();
//! let site: SiteSelector = "1,3".parse().unwrap();
//!
//! assert_eq!(period, Period::Day);
//! assert_eq!(date.to_string(), "2024-03-01,2024-03-07");
//! assert_eq!(site, SiteSelector::Many(vec![1, 3]));
//! ```

use crate::error::Error;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a tracked site
pub type SiteId = u32;

/// Opaque identifier of a child table inside an archive
pub type SubtableId = u64;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Archive period granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One calendar day
    Day,
    /// One calendar week
    Week,
    /// One calendar month
    Month,
    /// One calendar year
    Year,
    /// Arbitrary date range
    Range,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::Range => "range",
        };
        f.write_str(name)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "range" => Ok(Period::Range),
            other => Err(Error::InvalidQuery(format!("unknown period '{}'", other))),
        }
    }
}

/// Date component of a query
///
/// A range or relative selector combined with a non-range period makes the
/// archive answer with one table per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateSelector {
    /// A single date
    Date(NaiveDate),
    /// Inclusive date range
    Range {
        /// First date (inclusive)
        start: NaiveDate,
        /// Last date (inclusive)
        end: NaiveDate,
    },
    /// The last N periods including the current one
    Last(u32),
    /// The N periods before the current one
    Previous(u32),
}

impl DateSelector {
    /// Create a validated date range
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidQuery(format!(
                "invalid date range: start {} > end {}",
                start, end
            )));
        }
        Ok(DateSelector::Range { start, end })
    }
}

impl fmt::Display for DateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSelector::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            DateSelector::Range { start, end } => write!(
                f,
                "{},{}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            DateSelector::Last(n) => write!(f, "last{}", n),
            DateSelector::Previous(n) => write!(f, "previous{}", n),
        }
    }
}

impl FromStr for DateSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(n) = s.strip_prefix("last") {
            return parse_count(n, s).map(DateSelector::Last);
        }
        if let Some(n) = s.strip_prefix("previous") {
            return parse_count(n, s).map(DateSelector::Previous);
        }

        match s.split_once(',') {
            Some((start, end)) => DateSelector::range(parse_date(start)?, parse_date(end)?),
            None => parse_date(s).map(DateSelector::Date),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::InvalidQuery(format!("invalid date '{}': {}", s, e)))
}

fn parse_count(n: &str, original: &str) -> Result<u32, Error> {
    match n.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(Error::InvalidQuery(format!(
            "invalid relative date '{}'",
            original
        ))),
    }
}

/// Site component of a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteSelector {
    /// A single site
    Single(SiteId),
    /// Several sites; the archive answers with one entry per site
    Many(Vec<SiteId>),
    /// Every site the caller can see
    All,
}

impl fmt::Display for SiteSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteSelector::Single(id) => write!(f, "{}", id),
            SiteSelector::Many(ids) => {
                let joined: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                f.write_str(&joined.join(","))
            }
            SiteSelector::All => f.write_str("all"),
        }
    }
}

impl FromStr for SiteSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(SiteSelector::All);
        }

        let ids = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<SiteId>()
                    .map_err(|_| Error::InvalidQuery(format!("invalid site id '{}'", part)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match ids.as_slice() {
            [single] => Ok(SiteSelector::Single(*single)),
            _ => Ok(SiteSelector::Many(ids)),
        }
    }
}

/// A concrete period a fetched table belongs to
///
/// Archives attach this to every table they return. During path descent it
/// pins re-fetches to exactly this period instead of the outer query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodSpan {
    /// Granularity of the period
    pub granularity: Period,
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
}

impl PeriodSpan {
    /// Create a period span with validation
    pub fn new(granularity: Period, start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidQuery(format!(
                "invalid period: start {} > end {}",
                start, end
            )));
        }
        Ok(Self {
            granularity,
            start,
            end,
        })
    }

    /// Span covering a single day
    pub fn day(date: NaiveDate) -> Self {
        Self {
            granularity: Period::Day,
            start: date,
            end: date,
        }
    }

    /// Date selector covering exactly this period
    pub fn as_date_range(&self) -> DateSelector {
        DateSelector::Range {
            start: self.start,
            end: self.end,
        }
    }

    /// Key used for this period inside a collection
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{},{}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_period_round_trip() {
        for name in ["day", "week", "month", "year", "range"] {
            let period: Period = name.parse().unwrap();
            assert_eq!(period.to_string(), name);
        }
        assert!("decade".parse::<Period>().is_err());
    }

    #[test]
    fn test_date_selector_parsing() {
        assert_eq!(
            "2024-01-05".parse::<DateSelector>().unwrap(),
            DateSelector::Date(date("2024-01-05"))
        );
        assert_eq!(
            "last7".parse::<DateSelector>().unwrap(),
            DateSelector::Last(7)
        );
        assert_eq!(
            "previous30".parse::<DateSelector>().unwrap(),
            DateSelector::Previous(30)
        );
        assert_eq!(
            "2024-01-01,2024-01-31".parse::<DateSelector>().unwrap(),
            DateSelector::Range {
                start: date("2024-01-01"),
                end: date("2024-01-31"),
            }
        );
    }

    #[test]
    fn test_date_selector_rejects_bad_input() {
        assert!("2024-02-10,2024-02-01".parse::<DateSelector>().is_err());
        assert!("last0".parse::<DateSelector>().is_err());
        assert!("yesterdayish".parse::<DateSelector>().is_err());
    }

    #[test]
    fn test_site_selector() {
        assert_eq!("4".parse::<SiteSelector>().unwrap(), SiteSelector::Single(4));
        assert_eq!("all".parse::<SiteSelector>().unwrap(), SiteSelector::All);
        let many: SiteSelector = "1, 3".parse().unwrap();
        assert_eq!(many.to_string(), "1,3");
        assert!("1,x".parse::<SiteSelector>().is_err());
    }

    #[test]
    fn test_period_span() {
        let week = PeriodSpan::new(Period::Week, date("2024-01-01"), date("2024-01-07")).unwrap();
        assert_eq!(week.label(), "2024-01-01,2024-01-07");
        assert_eq!(week.as_date_range().to_string(), "2024-01-01,2024-01-07");
        assert_eq!(PeriodSpan::day(date("2024-01-03")).label(), "2024-01-03");
        assert!(PeriodSpan::new(Period::Week, date("2024-01-07"), date("2024-01-01")).is_err());
    }
}
