//! Selectors that narrow a session to one city, month and weekday.
//!
//! Every selector is parsed from free text through [`FromStr`]; parsing is the
//! only way to build one from user input, so an invalid selection never
//! reaches the loader.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::Weekday;
use serde::Serialize;

/// Month names covered by the source files, in calendar order.
pub const MONTHS: [&str; 6] = ["january", "february", "march", "april", "may", "june"];

/// Weekday names, Monday first.
pub const DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Lowercases and trims a raw answer the way every prompt expects it.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Capitalizes each whitespace-separated word: `"new york city"` → `"New York City"`.
pub fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Lowercase name as typed by the user.
    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }

    /// CSV file holding this city's trips, relative to the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        match City::ALL.into_iter().find(|c| c.name() == wanted) {
            Some(city) => Ok(city),
            None => bail!("Invalid city. Please choose from: Chicago, New York City, Washington."),
        }
    }
}

/// Month selector: a single month (1-based index into [`MONTHS`]) or every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(u32),
}

impl MonthFilter {
    pub fn matches(self, month: u32) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(m) => m == month,
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Month(m) => f.write_str(month_name(*m).unwrap_or("unknown")),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        if wanted == "all" {
            return Ok(MonthFilter::All);
        }
        match MONTHS.iter().position(|m| *m == wanted) {
            Some(idx) => Ok(MonthFilter::Month(idx as u32 + 1)),
            None => bail!("Invalid month. Please enter a month from January to June or 'all'."),
        }
    }
}

/// Day-of-week selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayFilter {
    #[default]
    All,
    Day(Weekday),
}

impl DayFilter {
    pub fn matches(self, day: Weekday) -> bool {
        match self {
            DayFilter::All => true,
            DayFilter::Day(d) => d == day,
        }
    }
}

impl fmt::Display for DayFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayFilter::All => f.write_str("all"),
            DayFilter::Day(d) => f.write_str(day_name(*d)),
        }
    }
}

impl FromStr for DayFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        if wanted == "all" {
            return Ok(DayFilter::All);
        }
        match DAYS.iter().position(|d| *d == wanted) {
            Some(idx) => Ok(DayFilter::Day(Weekday::try_from(idx as u8)?)),
            None => bail!("Invalid day. Please enter a day of the week or 'all'."),
        }
    }
}

/// Lowercase month name for a 1-based month number, if it is one of [`MONTHS`].
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get((month as usize).checked_sub(1)?).copied()
}

/// Lowercase full weekday name.
pub fn day_name(day: Weekday) -> &'static str {
    DAYS[day.num_days_from_monday() as usize]
}

/// A complete, validated (city, month, day) selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub city: City,
    pub month: MonthFilter,
    pub day: DayFilter,
}

impl Selection {
    pub fn new(city: City, month: MonthFilter, day: DayFilter) -> Self {
        Self { city, month, day }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "city={} month={} day={}", self.city, self.month, self.day)
    }
}
