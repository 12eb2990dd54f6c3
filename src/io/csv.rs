use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::column::{Column, ColumnType};
use crate::core::DataValue;
use crate::dataframe::DataFrame;
use crate::error::Result;

/// Options for reading delimited text
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the first record holds column names
    pub has_header: bool,

    /// Field delimiter
    pub delimiter: u8,

    /// Tokens read as missing values; quoting does not exempt a field
    pub na_values: Vec<String>,

    /// Infer Int64/Float64/Boolean columns; when false every column is String
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            na_values: ["", "NA", "NaN", "null"].iter().map(|s| s.to_string()).collect(),
            infer_types: true,
        }
    }
}

impl CsvOptions {
    fn is_na(&self, token: &str) -> bool {
        self.na_values.iter().any(|na| na == token)
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "true" | "TRUE" | "True" => Some(true),
        "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Narrowest type that every present token parses as: Int64, then Float64,
/// then Boolean, falling back to String
fn infer_column_type(tokens: &[Option<&str>]) -> ColumnType {
    let present = || tokens.iter().flatten();
    if present().next().is_none() {
        return ColumnType::String;
    }
    if present().all(|t| t.parse::<i64>().is_ok()) {
        ColumnType::Int64
    } else if present().all(|t| t.parse::<f64>().is_ok()) {
        ColumnType::Float64
    } else if present().all(|t| parse_bool(t).is_some()) {
        ColumnType::Boolean
    } else {
        ColumnType::String
    }
}

fn build_column(tokens: &[Option<&str>], column_type: ColumnType) -> Result<Column> {
    let values = tokens
        .iter()
        .map(|token| match token {
            None => DataValue::Na,
            Some(t) => match column_type {
                ColumnType::Int64 => t.parse::<i64>().map_or(DataValue::Na, DataValue::Int64),
                ColumnType::Float64 => t.parse::<f64>().map_or(DataValue::Na, DataValue::Float64),
                ColumnType::Boolean => parse_bool(t).map_or(DataValue::Na, DataValue::Boolean),
                ColumnType::String => DataValue::String(t.to_string()),
            },
        })
        .collect();
    Column::from_values(column_type, values)
}

/// Reads a CSV file into a table
pub fn read_csv<P: AsRef<Path>>(path: P, options: &CsvOptions) -> Result<DataFrame> {
    let file = File::open(path.as_ref())?;
    read_csv_from_reader(file, options)
}

/// Reads CSV data from any reader into a table
pub fn read_csv_from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<DataFrame> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let records: Vec<StringRecord> = rdr.records().collect::<std::result::Result<_, _>>()?;

    let headers: Vec<String> = if options.has_header {
        rdr.headers()?.iter().map(|h| h.to_string()).collect()
    } else {
        let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
        (0..width).map(|i| format!("column_{}", i)).collect()
    };

    let mut df = DataFrame::new();
    for (index, header) in headers.iter().enumerate() {
        // Short records are padded with missing values
        let tokens: Vec<Option<&str>> = records
            .iter()
            .map(|record| record.get(index).filter(|t| !options.is_na(t)))
            .collect();

        let column_type = if options.infer_types {
            infer_column_type(&tokens)
        } else {
            ColumnType::String
        };
        df.add_column(header.clone(), build_column(&tokens, column_type)?)?;
    }

    log::debug!(
        "read CSV: {} rows x {} columns",
        df.row_count(),
        df.column_count()
    );
    Ok(df)
}

/// Writes a table to a CSV file; missing values are written as `NA`.
///
/// The round trip is lossy for text that matches an NA token: with the
/// default [`CsvOptions`] a string cell holding `"NA"` or `""` reads back as
/// missing. Narrow [`CsvOptions::na_values`] to `["NA"]` to keep empty
/// strings.
pub fn write_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_csv_to_writer(df, file)
}

/// Writes a table as CSV to any writer; see [`write_csv`] for how missing
/// values come back
pub fn write_csv_to_writer<W: Write>(df: &DataFrame, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(df.column_names())?;

    for row in 0..df.row_count() {
        let record: Vec<String> = df.columns().map(|(_, c)| c.value(row).to_string()).collect();
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_narrowest_type() {
        assert_eq!(infer_column_type(&[Some("1"), None, Some("2")]), ColumnType::Int64);
        assert_eq!(infer_column_type(&[Some("1"), Some("2.5")]), ColumnType::Float64);
        assert_eq!(infer_column_type(&[Some("TRUE"), Some("false")]), ColumnType::Boolean);
        assert_eq!(infer_column_type(&[Some("1"), Some("x")]), ColumnType::String);
        assert_eq!(infer_column_type(&[None, None]), ColumnType::String);
    }
}
