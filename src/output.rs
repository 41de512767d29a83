//! Terminal and JSON rendering of the statistics passes.
//!
//! Each section prints a heading, its figures (or a "no data" notice), the
//! time it took, and a separator line.

use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use crate::loader::Dataset;
use crate::prompt::separator;
use crate::stats::{
    BirthYearStats, ColumnStats, DurationStats, Report, StationStats, TimeStats, UserStats,
    station_stats, time_stats, trip_duration_stats, user_stats,
};

pub const NO_DATA: &str = "No data available for this selection.";

/// Runs the four passes in order (time, station, duration, user) and prints each.
pub fn print_all_stats<W: Write>(out: &mut W, dataset: &Dataset) -> Result<()> {
    section(
        out,
        "Calculating The Most Frequent Times of Travel...",
        || time_stats(dataset),
        write_time_stats,
    )?;
    section(
        out,
        "Calculating The Most Popular Stations and Trip...",
        || station_stats(dataset),
        write_station_stats,
    )?;
    section(
        out,
        "Calculating Trip Duration...",
        || trip_duration_stats(dataset),
        write_duration_stats,
    )?;
    section(
        out,
        "Calculating User Stats...",
        || user_stats(dataset),
        write_user_stats,
    )?;
    Ok(())
}

fn section<W, T, C, P>(out: &mut W, title: &str, compute: C, print: P) -> Result<()>
where
    W: Write,
    C: FnOnce() -> Option<T>,
    P: FnOnce(&mut W, &T) -> Result<()>,
{
    writeln!(out, "\n{title}\n")?;
    let started = Instant::now();

    match compute() {
        Some(stats) => print(out, &stats)?,
        None => writeln!(out, "{NO_DATA}")?,
    }

    let elapsed = started.elapsed();
    debug!(section = title, elapsed_us = elapsed.as_micros() as u64, "Section done");
    writeln!(out, "\nThis took {:.2} seconds.", elapsed.as_secs_f64())?;
    separator(out)
}

pub fn write_time_stats<W: Write>(out: &mut W, stats: &TimeStats) -> Result<()> {
    writeln!(out, "Most Common Month: {}", stats.month_label())?;
    writeln!(out, "Most Common Day of Week: {}", stats.day_label())?;
    writeln!(out, "Most Common Start Hour: {}", stats.popular_hour)?;
    Ok(())
}

pub fn write_station_stats<W: Write>(out: &mut W, stats: &StationStats) -> Result<()> {
    writeln!(out, "Most Common Start Station: {}", stats.popular_start_station)?;
    writeln!(out, "Most Common End Station: {}", stats.popular_end_station)?;
    writeln!(out, "Most Common Trip: {}", stats.popular_trip)?;
    Ok(())
}

pub fn write_duration_stats<W: Write>(out: &mut W, stats: &DurationStats) -> Result<()> {
    writeln!(out, "Total Travel Time: {:.0} seconds", stats.total_seconds)?;
    writeln!(out, "Mean Travel Time: {:.2} seconds", stats.mean_seconds)?;
    Ok(())
}

pub fn write_user_stats<W: Write>(out: &mut W, stats: &UserStats) -> Result<()> {
    write_counts(out, "User Type", "Counts of User Types:", &stats.user_types)?;
    writeln!(out)?;
    write_counts(out, "Gender", "Counts of Gender:", &stats.genders)?;
    writeln!(out)?;

    match &stats.birth_years {
        ColumnStats::Present(BirthYearStats {
            earliest,
            most_recent,
            most_common,
        }) => {
            writeln!(out, "Birth Year Stats:")?;
            writeln!(out, "Earliest Year of Birth: {earliest}")?;
            writeln!(out, "Most Recent Year of Birth: {most_recent}")?;
            writeln!(out, "Most Common Year of Birth: {most_common}")?;
        }
        other => write_missing(out, "Birth Year", other)?,
    }
    Ok(())
}

fn write_counts<W: Write>(
    out: &mut W,
    column: &str,
    heading: &str,
    counts: &ColumnStats<Vec<(String, usize)>>,
) -> Result<()> {
    let ColumnStats::Present(counts) = counts else {
        return write_missing(out, column, counts);
    };

    writeln!(out, "{heading}")?;
    let width = counts.iter().map(|(v, _)| v.chars().count()).max().unwrap_or(0);
    for (value, count) in counts {
        writeln!(out, "{value:<width$}    {count}")?;
    }
    Ok(())
}

fn write_missing<W: Write, T>(out: &mut W, column: &str, stats: &ColumnStats<T>) -> Result<()> {
    match stats {
        ColumnStats::NotAvailable => {
            writeln!(out, "{column} data is not available for this city.")?
        }
        ColumnStats::NoValues => writeln!(out, "No {column} values for this selection.")?,
        ColumnStats::Present(_) => {}
    }
    Ok(())
}

/// Writes the full report as pretty-printed JSON.
pub fn print_json<W: Write>(out: &mut W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
