//! Command line parsing
//!
//! One command per line, whitespace separated:
//! ```text
//! insert <name> <value>
//! delete <name> <value>
//! find   <name>
//! rank   <name> <value>
//! select <n>
//! size
//! stats
//! ```

use crate::error::{Result, SpanListError};

use super::Record;

/// A parsed driver command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Insert a record (no-op when present)
    Insert(Record),

    /// Delete a record (no-op when absent)
    Delete(Record),

    /// List every value stored under a name
    Find { name: String },

    /// Number of records ordered before a record
    Rank(Record),

    /// Record at a zero-based rank
    Select { rank: u64 },

    /// Number of records
    Size,

    /// Structure and file statistics
    Stats,
}

/// Parse one line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(op) = words.next() else {
        return Ok(None);
    };

    let command = match op {
        "insert" => Command::Insert(record_args(op, &mut words)?),
        "delete" => Command::Delete(record_args(op, &mut words)?),
        "rank" => Command::Rank(record_args(op, &mut words)?),
        "find" => {
            let name = required(op, "name", words.next())?;
            // Validate the name now rather than at lookup
            Record::first_of(name)?;
            Command::Find {
                name: name.to_string(),
            }
        }
        "select" => {
            let rank = required(op, "rank", words.next())?;
            let rank = rank.parse().map_err(|_| {
                SpanListError::Command(format!("select: invalid rank {:?}", rank))
            })?;
            Command::Select { rank }
        }
        "size" => Command::Size,
        "stats" => Command::Stats,
        other => {
            return Err(SpanListError::Command(format!(
                "unknown command {:?}",
                other
            )))
        }
    };

    if let Some(extra) = words.next() {
        return Err(SpanListError::Command(format!(
            "{}: unexpected argument {:?}",
            op, extra
        )));
    }

    Ok(Some(command))
}

fn record_args<'a>(op: &str, words: &mut impl Iterator<Item = &'a str>) -> Result<Record> {
    let name = required(op, "name", words.next())?;
    let value = required(op, "value", words.next())?;
    let value = value.parse().map_err(|_| {
        SpanListError::Command(format!("{}: invalid value {:?}", op, value))
    })?;
    Record::new(name, value)
}

fn required<'a>(op: &str, what: &str, word: Option<&'a str>) -> Result<&'a str> {
    word.ok_or_else(|| SpanListError::Command(format!("{}: missing {}", op, what)))
}
