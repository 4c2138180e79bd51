//! Typing of raw CSV cells

use chrono::{NaiveDate, NaiveDateTime};
use tabsynth_core::{Column, DataType};

use crate::error::{Error, Result};

/// Cell contents read as a missing value
pub const MISSING_MARKERS: &[&str] = &["", "NA", "NaN", "null"];

/// Formats tried for timestamp columns without a declared format
const FALLBACK_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d"];

/// Check if a raw cell is missing
pub fn is_missing(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw.trim())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a timestamp as milliseconds since the epoch, UTC
pub fn parse_timestamp(raw: &str, format: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(raw, format)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, format).ok()?.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Infer the type of a column from its raw cells
///
/// Tries `Int64`, then `Float64`, then `Boolean`; anything else, including a
/// column with no present values, is a `String`. Timestamps are never
/// inferred and must be declared.
pub fn infer_data_type(values: &[&str]) -> DataType {
    let present: Vec<&str> = values.iter().map(|s| s.trim()).filter(|s| !is_missing(s)).collect();
    if present.is_empty() {
        return DataType::String;
    }

    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        return DataType::Int64;
    }
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        return DataType::Float64;
    }
    if present.iter().all(|s| parse_bool(s).is_some()) {
        return DataType::Boolean;
    }
    DataType::String
}

/// Parse the raw cells of one column as `data_type`
pub fn parse_column(
    name: &str,
    values: &[&str],
    data_type: DataType,
    datetime_format: Option<&str>,
) -> Result<Column> {
    fn cells<T>(
        name: &str,
        values: &[&str],
        data_type: DataType,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Vec<Option<T>>> {
        values
            .iter()
            .enumerate()
            .map(|(row, raw)| {
                let raw = raw.trim();
                if is_missing(raw) {
                    return Ok(None);
                }
                parse(raw).map(Some).ok_or_else(|| {
                    Error::Format(format!(
                        "row {}: cannot read '{raw}' in column '{name}' as {data_type}",
                        row + 1
                    ))
                })
            })
            .collect()
    }

    let column = match data_type {
        DataType::Boolean => Column::boolean(name, cells(name, values, data_type, parse_bool)?),
        DataType::Int64 => Column::int64(name, cells(name, values, data_type, |s| s.parse().ok())?),
        DataType::Float64 => {
            Column::float64(name, cells(name, values, data_type, |s| s.parse().ok())?)
        }
        DataType::String => {
            Column::string(name, cells(name, values, data_type, |s| Some(s.to_string()))?)
        }
        DataType::Timestamp => Column::timestamp(
            name,
            cells(name, values, data_type, |s| match datetime_format {
                Some(format) => parse_timestamp(s, format),
                None => FALLBACK_DATETIME_FORMATS.iter().find_map(|f| parse_timestamp(s, f)),
            })?,
        ),
    };
    Ok(column)
}
