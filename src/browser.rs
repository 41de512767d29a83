//! Paged viewer over the raw rows of a filtered dataset.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::debug;

use crate::filters::day_name;
use crate::loader::{Dataset, Trip};
use crate::prompt::Prompter;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const NO_MORE_DATA: &str = "No more data to display.";

const DERIVED_COLUMNS: [&str; 3] = ["month", "day_of_week", "hour"];

/// A cursor over a dataset that hands out consecutive pages and never wraps.
pub struct RawDataBrowser<'a> {
    dataset: &'a Dataset,
    cursor: usize,
    page_size: usize,
}

impl<'a> RawDataBrowser<'a> {
    pub fn new(dataset: &'a Dataset, page_size: usize) -> Self {
        Self {
            dataset,
            cursor: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.dataset.len()
    }

    /// Returns the next page and advances the cursor, or `None` once every row was shown.
    pub fn next_page(&mut self) -> Option<&'a [Trip]> {
        if self.is_exhausted() {
            return None;
        }
        let dataset: &'a Dataset = self.dataset;
        let trips = &dataset.trips;
        let end = (self.cursor + self.page_size).min(trips.len());
        let page = &trips[self.cursor..end];
        self.cursor += self.page_size;
        Some(page)
    }

    /// Shows pages while the user keeps answering yes.
    pub fn run<R: BufRead, W: Write>(&mut self, prompter: &mut Prompter<R, W>) -> Result<()> {
        let question = format!(
            "\nWould you like to see {} lines of raw data? Enter yes or no.",
            self.page_size
        );

        while prompter.confirm(&question)? {
            let out = prompter.output();
            match self.next_page() {
                Some(page) => write_rows(out, self.dataset, page)?,
                None => {
                    writeln!(out, "{NO_MORE_DATA}")?;
                    break;
                }
            }
            if self.is_exhausted() {
                writeln!(out, "{NO_MORE_DATA}")?;
                break;
            }
        }

        debug!(cursor = self.cursor, rows = self.dataset.len(), "Raw data browsing ended");
        Ok(())
    }
}

/// Writes `rows` as an aligned table: the row's source index, the source
/// columns in file order, then the derived calendar columns.
pub fn write_rows<W: Write>(out: &mut W, dataset: &Dataset, rows: &[Trip]) -> Result<()> {
    let mut header: Vec<String> = vec![String::new()];
    header.extend(dataset.headers.iter().map(str::to_string));
    header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|trip| {
            let mut cells = vec![trip.index.to_string()];
            cells.extend(trip.raw.iter().map(str::to_string));
            cells.push(trip.month.to_string());
            cells.push(day_name(trip.day_of_week).to_string());
            cells.push(trip.hour.to_string());
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for cells in &table {
        for (i, cell) in cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    write_line(out, &header, &widths)?;
    for cells in &table {
        write_line(out, cells, &widths)?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{City, DayFilter, MonthFilter};
    use crate::loader::read_trips;
    use std::io::Cursor;

    fn dataset(rows: usize) -> Dataset {
        let mut csv = String::from("Start Time,Trip Duration,Start Station,End Station\n");
        for i in 0..rows {
            csv.push_str(&format!("2017-06-05 {:02}:00:00,60,Station {i},End {i}\n", i % 24));
        }
        read_trips(City::Chicago, csv.as_bytes()).unwrap()
    }

    fn indices(page: &[Trip]) -> Vec<usize> {
        page.iter().map(|t| t.index).collect()
    }

    #[test]
    fn test_next_page_walks_twelve_rows() {
        let ds = dataset(12);
        let mut browser = RawDataBrowser::new(&ds, DEFAULT_PAGE_SIZE);

        assert_eq!(indices(browser.next_page().unwrap()), vec![0, 1, 2, 3, 4]);
        assert_eq!(indices(browser.next_page().unwrap()), vec![5, 6, 7, 8, 9]);
        assert_eq!(indices(browser.next_page().unwrap()), vec![10, 11]);
        assert!(browser.is_exhausted());
        assert!(browser.next_page().is_none());
        assert_eq!(browser.cursor(), 15);
    }

    #[test]
    fn test_run_twelve_rows_scenario() {
        let ds = dataset(12);
        let mut browser = RawDataBrowser::new(&ds, DEFAULT_PAGE_SIZE);
        let mut prompter = Prompter::new(Cursor::new(b"yes\nyes\nyes\nyes\n".to_vec()), Vec::new());

        browser.run(&mut prompter).unwrap();

        let (mut input, out) = prompter.into_inner();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(out.matches("Station 11").count(), 1);
        assert!(out.contains("Station 0"));
        assert_eq!(out.matches(NO_MORE_DATA).count(), 1);
        assert!(out.trim_end().ends_with(NO_MORE_DATA));
        // three questions asked, the fourth yes is never read
        assert_eq!(out.matches("Would you like to see 5 lines").count(), 3);
        let mut rest = String::new();
        input.read_line(&mut rest).unwrap();
        assert_eq!(rest, "yes\n");
    }

    #[test]
    fn test_run_stops_on_no() {
        let ds = dataset(12);
        let mut browser = RawDataBrowser::new(&ds, DEFAULT_PAGE_SIZE);
        let mut prompter = Prompter::new(Cursor::new(b"yes\nnope\nyes\n".to_vec()), Vec::new());

        browser.run(&mut prompter).unwrap();

        assert_eq!(browser.cursor(), 5);
        let out = String::from_utf8(prompter.into_inner().1).unwrap();
        assert!(out.contains("Station 4"));
        assert!(!out.contains("Station 5"));
        assert!(!out.contains(NO_MORE_DATA));
    }

    #[test]
    fn test_run_on_empty_dataset() {
        let ds = dataset(3).filter(MonthFilter::Month(1), DayFilter::All);
        let mut browser = RawDataBrowser::new(&ds, DEFAULT_PAGE_SIZE);
        let mut prompter = Prompter::new(Cursor::new(b"yes\n".to_vec()), Vec::new());

        browser.run(&mut prompter).unwrap();

        let out = String::from_utf8(prompter.into_inner().1).unwrap();
        assert!(out.contains(NO_MORE_DATA));
    }

    #[test]
    fn test_write_rows_keeps_column_order() {
        let ds = dataset(1);
        let mut out = Vec::new();
        write_rows(&mut out, &ds, &ds.trips).unwrap();
        let text = String::from_utf8(out).unwrap();

        let header = text.lines().next().unwrap();
        let start = header.find("Start Time").unwrap();
        let end = header.find("End Station").unwrap();
        let derived = header.find("day_of_week").unwrap();
        assert!(start < end && end < derived);
        assert!(text.lines().nth(1).unwrap().contains("monday"));
    }
}
