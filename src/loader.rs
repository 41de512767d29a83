//! CSV loader for city trip files.
//!
//! Reads every row of a city's file into a [`Dataset`], derives the calendar
//! fields from `Start Time`, then narrows the rows to a [`Selection`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, info};

use crate::filters::{City, DayFilter, MonthFilter, Selection};

pub const START_TIME: &str = "Start Time";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED_COLUMNS: [&str; 4] = [START_TIME, START_STATION, END_STATION, TRIP_DURATION];

const START_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A row as it appears in the source file.
#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type", default)]
    user_type: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    // Stored as a float (`1992.0`) in the source files.
    #[serde(rename = "Birth Year", default)]
    birth_year: Option<f64>,
}

/// One trip with its derived calendar fields.
#[derive(Debug, Clone)]
pub struct Trip {
    /// 0-based position of the row in the source file.
    pub index: usize,
    pub start_time: NaiveDateTime,
    pub start_station: String,
    pub end_station: String,
    pub trip_duration: f64,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,

    // derived from start_time
    pub month: u32,
    pub day_of_week: Weekday,
    pub hour: u32,

    /// The untouched source record, used by the raw data browser.
    pub raw: StringRecord,
}

/// Which optional columns the source file carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalColumns {
    pub user_type: bool,
    pub gender: bool,
    pub birth_year: bool,
}

impl OptionalColumns {
    fn from_headers(headers: &StringRecord) -> Self {
        let has = |name: &str| headers.iter().any(|h| h == name);
        Self {
            user_type: has(USER_TYPE),
            gender: has(GENDER),
            birth_year: has(BIRTH_YEAR),
        }
    }
}

/// The trips of one city, optionally narrowed by month and day.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub city: City,
    pub headers: StringRecord,
    pub columns: OptionalColumns,
    pub trips: Vec<Trip>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Keeps only the trips matching both filters. `All` leaves a dimension untouched.
    pub fn filter(mut self, month: MonthFilter, day: DayFilter) -> Self {
        self.trips
            .retain(|t| month.matches(t.month) && day.matches(t.day_of_week));
        self
    }
}

/// Path of a city's file under `data_dir`.
pub fn city_path(data_dir: &Path, city: City) -> PathBuf {
    data_dir.join(city.file_name())
}

/// Loads the selected city's trips from `data_dir` and applies the month/day filters.
///
/// # Errors
///
/// Returns an error naming the city and file if the file is missing, is not
/// valid CSV, lacks a required column, or holds a row that can not be parsed.
#[tracing::instrument(skip(data_dir), fields(selection = %selection))]
pub fn load_data(data_dir: &Path, selection: &Selection) -> Result<Dataset> {
    let dataset = load_city(data_dir, selection.city)?;
    let total = dataset.len();

    let dataset = dataset.filter(selection.month, selection.day);
    info!(total, kept = dataset.len(), "Trips filtered");

    Ok(dataset)
}

/// Loads every trip of `city` without filtering.
pub fn load_city(data_dir: &Path, city: City) -> Result<Dataset> {
    let path = city_path(data_dir, city);
    debug!(path = %path.display(), "Opening city data file");

    let file = File::open(&path)
        .with_context(|| format!("Failed to open data file for {city}: {}", path.display()))?;

    read_trips(city, file)
        .with_context(|| format!("Failed to load data for {city} from {}", path.display()))
}

/// Parses trips for `city` from any CSV source with a header row.
pub fn read_trips<R: Read>(city: City, source: R) -> Result<Dataset> {
    let mut rdr = csv::Reader::from_reader(source);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|name| !headers.iter().any(|h| h == *name))
        .collect();
    if !missing.is_empty() {
        bail!("Missing required column(s): {}", missing.join(", "));
    }

    let columns = OptionalColumns::from_headers(&headers);
    let mut trips = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let raw = result.with_context(|| format!("Malformed CSV at data row {}", index + 1))?;
        let row: TripRow = raw
            .deserialize(Some(&headers))
            .with_context(|| format!("Invalid values at data row {}", index + 1))?;
        let start_time = parse_start_time(&row.start_time)
            .with_context(|| format!("Invalid {START_TIME} at data row {}", index + 1))?;

        trips.push(Trip {
            index,
            start_time,
            start_station: row.start_station,
            end_station: row.end_station,
            trip_duration: row.trip_duration,
            user_type: row.user_type,
            gender: row.gender,
            birth_year: row.birth_year.map(|y| y as i32),
            month: start_time.month(),
            day_of_week: start_time.weekday(),
            hour: start_time.hour(),
            raw,
        });
    }

    debug!(%city, rows = trips.len(), ?columns, "Trips loaded");

    Ok(Dataset {
        city,
        headers,
        columns,
        trips,
    })
}

/// Parses a `Start Time` cell, accepting a space or `T` separator and optional fractional seconds.
pub fn parse_start_time(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| anyhow!("Unrecognized timestamp '{value}'"))
}
