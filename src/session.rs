//! The interactive loop: choose filters, load, report, browse, and maybe start over.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::info;

use crate::browser::RawDataBrowser;
use crate::config::Config;
use crate::loader::load_data;
use crate::output::print_all_stats;
use crate::prompt::Prompter;

const RESTART_QUESTION: &str = "\nWould you like to restart? Enter yes or no.";
const FAREWELL: &str = "Goodbye!";

/// Outcome of one pass through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Iteration {
    Restart,
    Quit,
}

pub struct Session<R, W> {
    config: Config,
    prompter: Prompter<R, W>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Self {
            config,
            prompter: Prompter::new(input, output),
        }
    }

    /// Runs iterations until the user declines to restart or the input closes.
    ///
    /// # Errors
    ///
    /// Fails if a city file can not be loaded or the terminal can not be written.
    pub fn run(&mut self) -> Result<()> {
        let mut iterations = 0usize;
        loop {
            iterations += 1;
            if self.iteration(iterations)? == Iteration::Quit {
                break;
            }
        }

        writeln!(self.prompter.output(), "{FAREWELL}")?;
        info!(iterations, "Session finished");
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.prompter.into_inner().1
    }

    #[tracing::instrument(skip(self))]
    fn iteration(&mut self, number: usize) -> Result<Iteration> {
        let Some(selection) = self.prompter.collect_selection()? else {
            return Ok(Iteration::Quit);
        };
        info!(%selection, "Selection collected");

        // The dataset lives for this iteration only.
        let dataset = load_data(&self.config.data_dir, &selection)?;

        print_all_stats(self.prompter.output(), &dataset)?;
        RawDataBrowser::new(&dataset, self.config.page_size).run(&mut self.prompter)?;

        if self.prompter.confirm(RESTART_QUESTION)? {
            Ok(Iteration::Restart)
        } else {
            Ok(Iteration::Quit)
        }
    }
}
