//! Reading student rosters from CSV files.
//!
//! A roster file has a header row `name,roll_no,class` followed by one student per row.

use crate::error::{Error, Result, parse_roll_no};
use serde::Deserialize;
use std::io;
use std::path::Path;

/// One row of a roster file.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct RosterRecord {
    pub name: String,
    pub roll_no: String,
    pub class: String,
}

impl RosterRecord {
    /// The row's roll number, parsed the same way as operator input.
    pub fn roll_no(&self) -> Result<i64> {
        parse_roll_no(&self.roll_no)
    }
}

/// Reads every row of the roster at `path`.
pub fn read_roster(path: impl AsRef<Path>) -> Result<Vec<RosterRecord>> {
    let file = std::fs::File::open(path)?;
    read_roster_from(file)
}

pub fn read_roster_from<R: io::Read>(reader: R) -> Result<Vec<RosterRecord>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .map(|record| record.map_err(Error::from))
        .collect()
}
