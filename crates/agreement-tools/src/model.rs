//! Domain Models
//!
//! Rows of the three agreement tables and the tabular result shape the
//! tools render for the model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row of the `maestro` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub agreement_id: String,
    pub customer_name: String,
    pub service_point_id: String,
}

/// Row of the `consumos` table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub agreement_id: String,
    pub date: NaiveDate,
    pub kwh: f64,
}

/// Row of the `actividades` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldActivity {
    pub service_point_id: String,
    pub description: String,
    pub date: NaiveDate,
}

/// Single value of a result set
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Real(_))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => f.write_str(&general(*v)),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// `%g` rendering: six significant digits, trailing zeros dropped,
/// scientific notation outside `1e-4..1e6`.
fn general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{value:.5e}");
    let (mantissa, exp) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if (-4..6).contains(&exp) {
        let decimals = usize::try_from(5 - exp).unwrap_or(0);
        trim_zeros(&format!("{value:.decimals$}")).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    }
}

fn trim_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

/// Named columns and rows, as read from the store
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with nulls.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A column is numeric when every non-null value in it is a number
    fn numeric_column(&self, index: usize) -> bool {
        let mut values = self
            .rows
            .iter()
            .map(|row| &row[index])
            .filter(|cell| **cell != Cell::Null)
            .peekable();
        values.peek().is_some() && values.all(Cell::is_numeric)
    }

    /// Render as a markdown pipe table. Numeric columns are right-aligned.
    pub fn to_markdown(&self) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let numeric: Vec<bool> = (0..self.columns.len()).map(|i| self.numeric_column(i)).collect();

        let line = |cells: Vec<String>| format!("| {} |", cells.join(" | "));
        let pad = |text: &str, i: usize| {
            let fill = " ".repeat(widths[i].saturating_sub(text.chars().count()));
            if numeric[i] { format!("{fill}{text}") } else { format!("{text}{fill}") }
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(line(
            self.columns.iter().enumerate().map(|(i, c)| pad(c, i)).collect(),
        ));
        lines.push(format!(
            "|{}|",
            widths
                .iter()
                .zip(&numeric)
                .map(|(w, right)| {
                    let dashes = "-".repeat(w + 1);
                    if *right { format!("{dashes}:") } else { format!(":{dashes}") }
                })
                .collect::<Vec<_>>()
                .join("|")
        ));
        for row in &rendered {
            lines.push(line(row.iter().enumerate().map(|(i, c)| pad(c, i)).collect()));
        }
        lines.join("\n")
    }
}
