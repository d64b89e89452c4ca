use std::io::Read;
use std::path::Path;

use anyhow::Context as _;
use chrono::{Datelike as _, NaiveDate};

use crate::error::{RegattaError, RegattaResult};

/// One row of the external tabular source: the miles each participant added
/// on `date`, plus how they were logged.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ProgressRow {
    pub date: NaiveDate,
    pub first_miles: f64,
    pub second_miles: f64,
    pub method: String,
}

/// One day's snapshot, ready for the renderer: cumulative positions for both
/// participants plus the deterministic pace-boat position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub pace: f64,
    pub first: f64,
    pub second: f64,
}

impl DayRecord {
    pub fn total_miles(&self) -> f64 {
        self.first + self.second
    }
}

/// Pace-boat position for a date: a straight line from 0 on Jan 1 to the full
/// course on Dec 31, leap-aware.
pub fn pace_for_date(date: NaiveDate, course_length: f64) -> f64 {
    f64::from(date.ordinal()) / f64::from(days_in_year(date.year())) * course_length
}

fn days_in_year(year: i32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    if leap { 366 } else { 365 }
}

/// Turn daily-increment rows into cumulative [`DayRecord`]s.
///
/// Rows must be in strictly ascending date order; anything else is a fatal
/// data error, matching the no-salvage policy of the rest of the pipeline.
pub fn build_day_records(rows: &[ProgressRow], course_length: f64) -> RegattaResult<Vec<DayRecord>> {
    let mut records = Vec::with_capacity(rows.len());
    let mut first = 0.0f64;
    let mut second = 0.0f64;
    let mut prev: Option<NaiveDate> = None;

    for row in rows {
        if let Some(p) = prev
            && row.date <= p
        {
            return Err(RegattaError::data(format!(
                "progress rows out of order: {} follows {}",
                row.date, p
            )));
        }
        if !row.first_miles.is_finite() || !row.second_miles.is_finite() {
            return Err(RegattaError::data(format!(
                "non-finite miles on {}",
                row.date
            )));
        }
        prev = Some(row.date);

        first += row.first_miles;
        second += row.second_miles;
        records.push(DayRecord {
            date: row.date,
            day_of_year: row.date.ordinal(),
            pace: pace_for_date(row.date, course_length),
            first,
            second,
        });
    }

    Ok(records)
}

pub fn read_progress_rows(reader: impl Read) -> RegattaResult<Vec<ProgressRow>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv.deserialize() {
        let row: ProgressRow =
            result.map_err(|e| RegattaError::data(format!("bad progress row: {e}")))?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(RegattaError::data("progress source has no rows"));
    }
    Ok(rows)
}

pub fn load_progress_csv(path: &Path, course_length: f64) -> RegattaResult<Vec<DayRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open progress csv '{}'", path.display()))?;
    let rows = read_progress_rows(std::io::BufReader::new(file))?;
    build_day_records(&rows, course_length)
}
