use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

pub const MIN_COLUMN_WIDTH: f64 = 5.0;

/// One user row as shown in the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub email: String,
    pub date: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Record {
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::ID => self.id.clone(),
            Column::Name => self.name.clone(),
            Column::Age => self.age.to_string(),
            Column::Gender => self.gender.clone(),
            Column::Email => self.email.clone(),
            // Only the calendar date is interesting in the table
            Column::Date => self.date.get(..10).unwrap_or(&self.date).to_string(),
        }
    }

    /// Render the record as a single csv line in column order.
    pub fn as_csv(&self, order: &[Column]) -> String {
        order
            .iter()
            .map(|&c| wrap_cell_content(&self.cell(c)))
            .collect::<Vec<String>>()
            .join(",")
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataClass {
    Numeric,
    Temporal,
    Textual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    ID,
    Name,
    Age,
    Gender,
    Email,
    Date,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::ID,
        Column::Name,
        Column::Age,
        Column::Gender,
        Column::Email,
        Column::Date,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::ID => "ID",
            Column::Name => "Name",
            Column::Age => "Age",
            Column::Gender => "Gender",
            Column::Email => "Email",
            Column::Date => "Date",
        }
    }

    /// Width in percent of the table width. The defaults add up to 100.
    pub fn default_width(&self) -> f64 {
        match self {
            Column::ID => 10.0,
            Column::Name => 25.0,
            Column::Age => 10.0,
            Column::Gender => 15.0,
            Column::Email => 20.0,
            Column::Date => 20.0,
        }
    }

    pub fn data_class(&self) -> DataClass {
        match self {
            Column::ID | Column::Age => DataClass::Numeric,
            Column::Date => DataClass::Temporal,
            Column::Name | Column::Gender | Column::Email => DataClass::Textual,
        }
    }

    /// Ascending order of two records on this column.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            Column::ID => compare_numeric_text(&a.id, &b.id),
            Column::Age => a.age.cmp(&b.age),
            Column::Date => compare_dates(&a.date, &b.date),
            Column::Name => locale_cmp(&a.name, &b.name),
            Column::Email => locale_cmp(&a.email, &b.email),
            Column::Gender => locale_cmp(&a.gender, &b.gender),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn as_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Ids are uuid prefixes, so most of them are not numbers at all.
// Valid numbers come first, everything else falls back to text order.
fn compare_numeric_text(a: &str, b: &str) -> Ordering {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Case-insensitive order with lowercase before uppercase on ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
