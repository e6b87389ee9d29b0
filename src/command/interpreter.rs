//! Command interpreter
//!
//! Runs parsed commands against an [`OrderedSet`] of [`Record`]s and renders
//! their output as text.

use std::io::{BufRead, Write};

use tracing::{debug, warn};

use crate::collections::OrderedSet;
use crate::config::Config;
use crate::error::{Result, SpanListError};

use super::{parse_line, Command, Record};

/// Token printed when a lookup matches nothing
pub const NO_MATCH: &str = "null";

/// Outcome of [`Interpreter::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands executed successfully
    pub executed: u64,
    /// Lines rejected as malformed
    pub rejected: u64,
}

/// Executes driver commands against a record set
pub struct Interpreter {
    set: OrderedSet<Record>,
}

impl Interpreter {
    /// Open (or create) the record set `name`
    pub fn open(config: &Config, name: &str) -> Result<Self> {
        Ok(Self {
            set: OrderedSet::open_named(config, name)?,
        })
    }

    pub fn new(set: OrderedSet<Record>) -> Self {
        Self { set }
    }

    /// Execute one command, returning the line to print (if any)
    pub fn execute(&mut self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Insert(record) => {
                self.set.insert(record)?;
                Ok(None)
            }
            Command::Delete(record) => {
                self.set.erase(&record)?;
                Ok(None)
            }
            Command::Find { name } => {
                let from = self.set.lower_bound(&Record::first_of(&name)?)?;
                let to = self.set.upper_bound(&Record::last_of(&name)?)?;
                let values = self
                    .set
                    .range(from, to)
                    .map(|record| record.map(|r| r.value().to_string()))
                    .collect::<Result<Vec<_>>>()?;

                if values.is_empty() {
                    Ok(Some(NO_MATCH.to_string()))
                } else {
                    Ok(Some(values.join(" ")))
                }
            }
            Command::Rank(record) => Ok(Some(self.set.order_of_key(&record)?.to_string())),
            Command::Select { rank } => {
                let pos = self.set.find_by_order(rank)?;
                if pos.is_end() {
                    Ok(Some(NO_MATCH.to_string()))
                } else {
                    Ok(Some(self.set.get(pos)?.to_string()))
                }
            }
            Command::Size => Ok(Some(self.set.len().to_string())),
            Command::Stats => {
                let file_bytes = self.set.heap().file_len()?;
                Ok(Some(format!(
                    "len={} max_level={} node_size={} file_bytes={}",
                    self.set.len(),
                    self.set.max_level(),
                    self.set.node_size(),
                    file_bytes
                )))
            }
        }
    }

    /// Read commands from `input` until EOF, writing output lines to `output`
    ///
    /// If the first non-blank line is a bare number it is taken as the count
    /// of commands to read. Malformed lines are reported on `output` as
    /// `error: ...` and skipped; I/O failures abort the run.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut limit: Option<u64> = None;
        let mut seen_first = false;

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if !seen_first {
                seen_first = true;
                if let Ok(count) = trimmed.parse::<u64>() {
                    debug!(count, "Command count header");
                    limit = Some(count);
                    continue;
                }
            }

            if limit.is_some_and(|n| summary.executed + summary.rejected >= n) {
                break;
            }

            match parse_line(trimmed).and_then(|cmd| match cmd {
                Some(cmd) => self.execute(cmd),
                None => Ok(None),
            }) {
                Ok(Some(text)) => {
                    writeln!(output, "{}", text)?;
                    summary.executed += 1;
                }
                Ok(None) => summary.executed += 1,
                Err(SpanListError::Command(msg)) => {
                    warn!(line = index + 1, "{}", msg);
                    writeln!(output, "error: {}", msg)?;
                    summary.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        output.flush()?;
        Ok(summary)
    }

    /// Underlying record set
    pub fn set_mut(&mut self) -> &mut OrderedSet<Record> {
        &mut self.set
    }

    /// Flush headers, sync, and release the file
    pub fn close(self) -> Result<()> {
        self.set.close()
    }
}
