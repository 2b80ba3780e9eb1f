//! Calendar helpers: day keys and calendar months

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The canonical `YYYY-MM-DD` name of a calendar day.
///
/// Two dates share a `DayKey` if and only if they denote the same calendar day.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayKey {
    content: String,
}

impl DayKey {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Returns the day this key denotes
    pub fn to_date(&self) -> NaiveDate {
        // Keys can only be built from valid dates
        NaiveDate::parse_from_str(&self.content, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self { content: date.format("%Y-%m-%d").to_string() }
    }
}

impl From<&NaiveDate> for DayKey {
    fn from(date: &NaiveDate) -> Self {
        Self::from(*date)
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
        Ok(Self::from(date))
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}


/// A calendar month of a given year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month {
    year: i32,
    /// 1-based, like `chrono::Datelike::month`
    month: u32,
}

impl Month {
    /// Returns `None` when `month` is not in `1..=12` or the year is out of chrono's range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self { year, month })
    }

    /// The month that contains `date`
    pub fn of(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32   { self.year  }
    pub fn month(&self) -> u32  { self.month }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        self.next()
            .and_then(|next| next.first_day().pred_opt())
            // December of chrono's last supported year
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(first.year(), 12, 31).unwrap_or(NaiveDate::MAX))
    }

    pub fn len(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every day of this month, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day();
        first.iter_days().take(self.len() as usize)
    }

    pub fn next(&self) -> Option<Self> {
        match self.month {
            12 => Self::new(self.year + 1, 1),
            m => Self::new(self.year, m + 1),
        }
    }

    pub fn previous(&self) -> Option<Self> {
        match self.month {
            1 => Self::new(self.year - 1, 12),
            m => Self::new(self.year, m - 1),
        }
    }
}

impl FromStr for Month {
    type Err = String;

    /// Parses a `YYYY-MM` string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.split_once('-')
            .ok_or_else(|| format!("{:?} is not in the YYYY-MM format", s))?;
        let year: i32 = year.parse().map_err(|err| format!("Invalid year in {:?}: {}", s, err))?;
        let month: u32 = month.parse().map_err(|err| format!("Invalid month in {:?}: {}", s, err))?;
        Self::new(year, month).ok_or_else(|| format!("{:?} is not a valid month", s))
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
