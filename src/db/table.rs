//! In-memory result sets

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column not found: {0}")]
    MissingColumn(String),
    #[error("column {column}, row {row}: expected a number, found {found:?}")]
    NotNumeric {
        column: String,
        row: usize,
        found: Cell,
    },
}

/// A single value of a result set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => f.write_str(&format_number(*v)),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

/// Whole numbers print without a fraction, everything else with two decimals
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// A fully materialized query result. Column names are the query's output aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>, TableError> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Numeric view of a column. NULL counts as zero.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        self.column(name)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Cell::Null => Ok(0.0),
                other => other.as_f64().ok_or_else(|| TableError::NotNumeric {
                    column: name.to_string(),
                    row,
                    found: other.clone(),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["COUNTRYNAME".into(), "TOTALCOUNT".into()],
            vec![
                vec![Cell::Text("Cuba".into()), Cell::Integer(12)],
                vec![Cell::Text("Somalia".into()), Cell::Null],
            ],
        )
    }

    #[test]
    fn looks_up_columns_by_alias() {
        let table = sample();
        assert_eq!(table.column_index("TOTALCOUNT"), Ok(1));
        assert_eq!(
            table.column("COUNTRYNAME").unwrap(),
            vec![&Cell::Text("Cuba".into()), &Cell::Text("Somalia".into())]
        );
        assert_eq!(
            table.column("CountryName"),
            Err(TableError::MissingColumn("CountryName".into()))
        );
    }

    #[test]
    fn numeric_column_treats_null_as_zero() {
        assert_eq!(sample().numeric_column("TOTALCOUNT").unwrap(), vec![12.0, 0.0]);
    }

    #[test]
    fn numeric_column_rejects_text() {
        let err = sample().numeric_column("COUNTRYNAME").unwrap_err();
        assert!(matches!(err, TableError::NotNumeric { row: 0, .. }));
    }

    #[test]
    fn formats_numbers_for_display() {
        assert_eq!(Cell::Real(60.0).to_string(), "60");
        assert_eq!(Cell::Real(2.346).to_string(), "2.35");
        assert_eq!(Cell::Integer(-3).to_string(), "-3");
        assert_eq!(Cell::Null.to_string(), "");
    }

    #[test]
    fn serializes_cells_as_plain_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["rows"][0][1], 12);
        assert!(json["rows"][1][1].is_null());
        assert_eq!(json["columns"][0], "COUNTRYNAME");
    }
}
