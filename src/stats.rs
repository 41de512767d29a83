//! The four statistics passes run over a filtered [`Dataset`].
//!
//! Each pass is read-only and independent of the others. A pass over an empty
//! dataset returns `None` rather than computing a mode, mean, or extreme of
//! nothing.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filters::{City, DAYS, Selection, month_name, title_case};
use crate::loader::Dataset;

/// Most frequent value of `values`.
///
/// Ties go to the smallest value by `Ord`, so the winner never depends on row
/// order or hashing.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    let counts = tally(values);

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        // Strictly greater keeps the first (smallest) key among equal counts.
        if best.as_ref().is_none_or(|(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Occurrences of each distinct value, highest count first, ties by value ascending.
pub fn value_counts<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    let mut counts: Vec<(T, usize)> = tally(values).into_iter().collect();
    // BTreeMap iteration is already value-ascending; a stable sort keeps that for ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn tally<T, I>(values: I) -> BTreeMap<T, usize>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    /// 1-based month number.
    pub popular_month: u32,
    pub popular_day: String,
    pub popular_hour: u32,
}

impl TimeStats {
    /// Capitalized month name, or the number if it falls outside the known months.
    pub fn month_label(&self) -> String {
        month_name(self.popular_month)
            .map(title_case)
            .unwrap_or_else(|| self.popular_month.to_string())
    }

    pub fn day_label(&self) -> String {
        title_case(&self.popular_day)
    }
}

/// Most frequent month, weekday and start hour.
pub fn time_stats(dataset: &Dataset) -> Option<TimeStats> {
    let trips = &dataset.trips;

    let popular_month = mode(trips.iter().map(|t| t.month))?;
    // Monday-first index, so ties resolve to the earlier day of the week.
    let popular_day = mode(trips.iter().map(|t| t.day_of_week.num_days_from_monday()))?;
    let popular_hour = mode(trips.iter().map(|t| t.hour))?;

    Some(TimeStats {
        popular_month,
        popular_day: DAYS[popular_day as usize].to_string(),
        popular_hour,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub popular_start_station: String,
    pub popular_end_station: String,
    pub popular_trip: String,
}

/// Joins a start and end station into the trip label used for popularity counts.
pub fn trip_label(start: &str, end: &str) -> String {
    format!("{start} -> {end}")
}

/// Most popular start station, end station, and start/end combination.
pub fn station_stats(dataset: &Dataset) -> Option<StationStats> {
    let trips = &dataset.trips;

    let popular_start_station = mode(trips.iter().map(|t| t.start_station.as_str()))?;
    let popular_end_station = mode(trips.iter().map(|t| t.end_station.as_str()))?;
    let popular_trip = mode(
        trips
            .iter()
            .map(|t| trip_label(&t.start_station, &t.end_station)),
    )?;

    Some(StationStats {
        popular_start_station: popular_start_station.to_string(),
        popular_end_station: popular_end_station.to_string(),
        popular_trip,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trips: usize,
    pub total_seconds: f64,
    pub mean_seconds: f64,
}

/// Total and mean trip duration, in seconds.
pub fn trip_duration_stats(dataset: &Dataset) -> Option<DurationStats> {
    if dataset.is_empty() {
        return None;
    }

    let total_seconds: f64 = dataset.trips.iter().map(|t| t.trip_duration).sum();
    let trips = dataset.len();

    Some(DurationStats {
        trips,
        total_seconds,
        mean_seconds: total_seconds / trips as f64,
    })
}

/// Result for an optional source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ColumnStats<T> {
    /// The city's file has no such column.
    NotAvailable,
    /// The column exists but every selected row left it empty.
    NoValues,
    Present(T),
}

impl<T> ColumnStats<T> {
    fn from_values(available: bool, value: Option<T>) -> Self {
        match (available, value) {
            (false, _) => ColumnStats::NotAvailable,
            (true, None) => ColumnStats::NoValues,
            (true, Some(v)) => ColumnStats::Present(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: ColumnStats<Vec<(String, usize)>>,
    pub genders: ColumnStats<Vec<(String, usize)>>,
    pub birth_years: ColumnStats<BirthYearStats>,
}

/// Counts by user type and gender, and birth year extremes and mode.
///
/// Each optional column is reported independently; a city lacking one still
/// reports the others.
pub fn user_stats(dataset: &Dataset) -> Option<UserStats> {
    if dataset.is_empty() {
        return None;
    }
    let trips = &dataset.trips;
    let columns = dataset.columns;

    let user_types = value_counts(trips.iter().filter_map(|t| t.user_type.as_deref()));
    let genders = value_counts(trips.iter().filter_map(|t| t.gender.as_deref()));

    let years: Vec<i32> = trips.iter().filter_map(|t| t.birth_year).collect();
    let birth_years = match (years.iter().min(), years.iter().max(), mode(years.iter())) {
        (Some(&earliest), Some(&most_recent), Some(&most_common)) => Some(BirthYearStats {
            earliest,
            most_recent,
            most_common,
        }),
        _ => None,
    };

    Some(UserStats {
        user_types: ColumnStats::from_values(columns.user_type, owned_counts(user_types)),
        genders: ColumnStats::from_values(columns.gender, owned_counts(genders)),
        birth_years: ColumnStats::from_values(columns.birth_year, birth_years),
    })
}

fn owned_counts(counts: Vec<(&str, usize)>) -> Option<Vec<(String, usize)>> {
    if counts.is_empty() {
        return None;
    }
    Some(
        counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect(),
    )
}

/// All four passes over one dataset, as emitted by the JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub city: City,
    pub month: String,
    pub day: String,
    pub trips: usize,
    pub time: Option<TimeStats>,
    pub stations: Option<StationStats>,
    pub duration: Option<DurationStats>,
    pub users: Option<UserStats>,
}

impl Report {
    pub fn build(dataset: &Dataset, selection: &Selection) -> Self {
        Report {
            city: selection.city,
            month: selection.month.to_string(),
            day: selection.day.to_string(),
            trips: dataset.len(),
            time: time_stats(dataset),
            stations: station_stats(dataset),
            duration: trip_duration_stats(dataset),
            users: user_stats(dataset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{DayFilter, MonthFilter};
    use crate::loader::read_trips;

    const HEADER: &str = "Start Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year\n";

    fn dataset(rows: &str) -> Dataset {
        read_trips(City::Chicago, format!("{HEADER}{rows}").as_bytes()).unwrap()
    }

    fn sample() -> Dataset {
        dataset(
            "2017-06-05 17:00:00,100,A,B,Subscriber,Male,1980.0\n\
             2017-06-06 17:30:00,200,A,C,Subscriber,Female,1990.0\n\
             2017-05-06 08:00:00,300,B,C,Customer,,\n\
             2017-06-05 09:00:00,400,A,B,Subscriber,Male,1990.0\n",
        )
    }

    #[test]
    fn test_mode_picks_most_frequent() {
        assert_eq!(mode(vec![3, 1, 3, 2]), Some(3));
        assert_eq!(mode(vec!["b", "a", "b"]), Some("b"));
    }

    #[test]
    fn test_mode_tie_break_is_smallest_value() {
        assert_eq!(mode(vec!["Zed St", "Alpha St", "Zed St", "Alpha St"]), Some("Alpha St"));
        // Order of appearance does not matter.
        assert_eq!(mode(vec!["Alpha St", "Zed St", "Zed St", "Alpha St"]), Some("Alpha St"));
        assert_eq!(mode(vec![17, 8, 8, 17]), Some(8));
    }

    #[test]
    fn test_mode_of_nothing_is_none() {
        assert_eq!(mode(Vec::<u32>::new()), None);
    }

    #[test]
    fn test_value_counts_order() {
        let counts = value_counts(vec!["b", "a", "c", "c", "b", "c"]);
        assert_eq!(counts, vec![("c", 3), ("b", 2), ("a", 1)]);

        let tied = value_counts(vec!["z", "y", "y", "z"]);
        assert_eq!(tied, vec![("y", 2), ("z", 2)]);
    }

    #[test]
    fn test_time_stats() {
        let stats = time_stats(&sample()).unwrap();
        assert_eq!(stats.popular_month, 6);
        assert_eq!(stats.month_label(), "June");
        assert_eq!(stats.popular_day, "monday");
        assert_eq!(stats.day_label(), "Monday");
        assert_eq!(stats.popular_hour, 17);
    }

    #[test]
    fn test_time_stats_weekday_tie_prefers_monday_side() {
        // One Sunday, one Monday: Monday comes first in the week.
        let ds = dataset(
            "2017-06-04 10:00:00,1,A,B,,,\n\
             2017-06-05 11:00:00,1,A,B,,,\n",
        );
        assert_eq!(time_stats(&ds).unwrap().popular_day, "monday");
    }

    #[test]
    fn test_station_stats() {
        let stats = station_stats(&sample()).unwrap();
        assert_eq!(stats.popular_start_station, "A");
        // B and C tie on two each.
        assert_eq!(stats.popular_end_station, "B");
        assert_eq!(stats.popular_trip, "A -> B");
    }

    #[test]
    fn test_station_tie_break_is_stable_across_runs() {
        let ds = dataset(
            "2017-06-04 10:00:00,1,Wabash,X,,,\n\
             2017-06-05 11:00:00,1,Clark,X,,,\n",
        );
        let first = station_stats(&ds).unwrap();
        for _ in 0..10 {
            assert_eq!(station_stats(&ds).unwrap(), first);
        }
        assert_eq!(first.popular_start_station, "Clark");
    }

    #[test]
    fn test_trip_duration_stats() {
        let stats = trip_duration_stats(&sample()).unwrap();
        assert_eq!(stats.trips, 4);
        assert_eq!(stats.total_seconds, 1000.0);
        assert_eq!(stats.mean_seconds, 250.0);
    }

    #[test]
    fn test_user_stats() {
        let stats = user_stats(&sample()).unwrap();
        assert_eq!(
            stats.user_types,
            ColumnStats::Present(vec![("Subscriber".to_string(), 3), ("Customer".to_string(), 1)])
        );
        assert_eq!(
            stats.genders,
            ColumnStats::Present(vec![("Male".to_string(), 2), ("Female".to_string(), 1)])
        );
        assert_eq!(
            stats.birth_years,
            ColumnStats::Present(BirthYearStats {
                earliest: 1980,
                most_recent: 1990,
                most_common: 1990,
            })
        );
    }

    #[test]
    fn test_user_stats_without_gender_column() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type,Birth Year\n\
                   2017-06-05 17:00:00,100,A,B,Subscriber,1980.0\n";
        let ds = read_trips(City::Washington, csv.as_bytes()).unwrap();
        let stats = user_stats(&ds).unwrap();

        assert_eq!(stats.genders, ColumnStats::NotAvailable);
        assert_eq!(
            stats.user_types,
            ColumnStats::Present(vec![("Subscriber".to_string(), 1)])
        );
        assert!(matches!(stats.birth_years, ColumnStats::Present(_)));
    }

    #[test]
    fn test_user_stats_with_blank_column_values() {
        let ds = sample().filter(MonthFilter::Month(5), DayFilter::All);
        let stats = user_stats(&ds).unwrap();
        assert_eq!(stats.genders, ColumnStats::NoValues);
        assert_eq!(stats.birth_years, ColumnStats::NoValues);
        assert!(matches!(stats.user_types, ColumnStats::Present(_)));
    }

    #[test]
    fn test_every_pass_handles_empty_dataset() {
        let ds = sample().filter(MonthFilter::Month(1), DayFilter::All);
        assert!(ds.is_empty());

        assert_eq!(time_stats(&ds), None);
        assert_eq!(station_stats(&ds), None);
        assert_eq!(trip_duration_stats(&ds), None);
        assert_eq!(user_stats(&ds), None);

        let selection = Selection::new(City::Chicago, MonthFilter::Month(1), DayFilter::All);
        let report = Report::build(&ds, &selection);
        assert_eq!(report.month, "january");
        assert_eq!(report.trips, 0);
        assert!(report.time.is_none());
    }

    #[test]
    fn test_report_serializes() {
        let selection = Selection::new(City::Chicago, MonthFilter::All, DayFilter::All);
        let report = Report::build(&sample(), &selection);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["city"], "chicago");
        assert_eq!(json["time"]["popular_hour"], 17);
        assert_eq!(json["users"]["genders"]["status"], "present");

        let selection = Selection::new(City::NewYorkCity, MonthFilter::All, DayFilter::All);
        let json = serde_json::to_value(Report::build(&sample(), &selection)).unwrap();
        assert_eq!(json["city"], "new_york_city");
    }
}
