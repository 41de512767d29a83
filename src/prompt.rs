//! Line-based terminal prompts.
//!
//! [`Prompter`] is generic over its reader and writer so sessions can be driven
//! from stdin/stdout or from in-memory buffers.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::filters::{City, DayFilter, MonthFilter, Selection, normalize};

pub const SEPARATOR_WIDTH: usize = 40;

const GREETING: &str = "Hello! Let's explore some US bikeshare data!";
const CITY_QUESTION: &str = "Would you like to see data for Chicago, New York City, or Washington?";
const MONTH_QUESTION: &str = "Which month? January, February, March, April, May, June or 'all'?";
const DAY_QUESTION: &str = "Which day? Monday, Tuesday, ... Sunday or 'all'?";

/// Writes the 40-dash line that separates report sections.
pub fn separator<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    Ok(())
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Output sink shared with the report printers.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Prints `question` and reads one line. `None` means the input is closed.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        writeln!(self.output, "{question}")?;
        self.output.flush()?;

        let mut buf = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut buf)
            .context("Failed to read answer")?;
        if read == 0 {
            debug!(question, "Input closed");
            return Ok(None);
        }
        // Undecodable bytes become U+FFFD and fail validation like any other bad answer.
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Asks a yes/no question. Only `yes` (any case, surrounding blanks ignored) is a yes.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        Ok(self
            .ask(question)?
            .is_some_and(|answer| normalize(&answer) == "yes"))
    }

    /// Asks until the answer parses as `T`, printing the parse error after each rejection.
    pub fn ask_until_valid<T>(&mut self, question: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr<Err = anyhow::Error>,
    {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    debug!(answer = answer.trim(), "Rejected answer");
                    writeln!(self.output, "{e}")?;
                }
            }
        }
    }

    /// Collects a city, month and day, re-asking each until it is valid.
    ///
    /// Returns `None` if the input closes before all three are given.
    pub fn collect_selection(&mut self) -> Result<Option<Selection>> {
        writeln!(self.output, "{GREETING}")?;

        let Some(city) = self.ask_until_valid::<City>(CITY_QUESTION)? else {
            return Ok(None);
        };
        let Some(month) = self.ask_until_valid::<MonthFilter>(MONTH_QUESTION)? else {
            return Ok(None);
        };
        let Some(day) = self.ask_until_valid::<DayFilter>(DAY_QUESTION)? else {
            return Ok(None);
        };

        separator(&mut self.output)?;
        Ok(Some(Selection::new(city, month, day)))
    }
}
