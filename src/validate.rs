use crate::error::ValidationError;
use crate::schema::{numeric_text, ColumnDef, ColumnKind, TableSchema};
use crate::types::{ExtractedRow, TypedRow, TypedValue};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tracing::warn;

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// The first bad row fails the whole batch.
    FailFast,
    /// Bad rows are logged and dropped.
    SkipInvalid,
}

/// Parse a schedule date: ISO `2023-09-07`, or `September 7` resolved
/// against the season (January through July belong to the following year).
pub fn parse_game_date(raw: &str, season: i32) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    let probe = NaiveDate::parse_from_str(&format!("{raw} {season}"), "%B %d %Y").ok()?;
    if probe.month() <= 7 {
        NaiveDate::from_ymd_opt(season + 1, probe.month(), probe.day())
    } else {
        Some(probe)
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let cleaned = numeric_text(s);
            cleaned.parse::<i64>().ok().or_else(|| {
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn parse_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_text(s).parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn check_range(col: &ColumnDef, table: &str, v: f64) -> Result<(), ValidationError> {
    if let Some(min) = col.min {
        if v < min {
            return Err(ValidationError::new(table, col.name, format!("must be >= {min}, got {v}")));
        }
    }
    if let Some(max) = col.max {
        if v > max {
            return Err(ValidationError::new(table, col.name, format!("must be <= {max}, got {v}")));
        }
    }
    Ok(())
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn validate_column(
    schema: &TableSchema,
    col: &ColumnDef,
    value: Option<&Value>,
    season: Option<i32>,
) -> Result<TypedValue, ValidationError> {
    let table = schema.table;
    let value = match value {
        Some(v) if !is_blank(Some(v)) => v,
        _ if col.required => {
            return Err(ValidationError::new(table, col.name, "is required"));
        }
        _ => return Ok(TypedValue::Null),
    };

    match col.kind {
        ColumnKind::Int => {
            let v = parse_int(value).ok_or_else(|| {
                ValidationError::new(table, col.name, format!("expected integer, got '{}'", as_text(value)))
            })?;
            check_range(col, table, v as f64)?;
            Ok(TypedValue::Int(v))
        }
        ColumnKind::Decimal => {
            let v = parse_decimal(value).ok_or_else(|| {
                ValidationError::new(table, col.name, format!("expected number, got '{}'", as_text(value)))
            })?;
            check_range(col, table, v)?;
            Ok(TypedValue::Real(v))
        }
        ColumnKind::Text(max_len) => {
            let s = as_text(value);
            if s.chars().count() > max_len {
                return Err(ValidationError::new(
                    table,
                    col.name,
                    format!("exceeds {max_len} characters"),
                ));
            }
            Ok(TypedValue::Text(s))
        }
        ColumnKind::Date => {
            let raw = as_text(value);
            let season = season.unwrap_or_default();
            parse_game_date(&raw, season)
                .map(|d| TypedValue::Text(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| ValidationError::new(table, col.name, format!("invalid date '{raw}'")))
        }
    }
}

/// Convert one extracted row into the schema's typed columns.
///
/// Keys the schema does not know are ignored; missing optional columns are null.
pub fn validate_row(schema: &TableSchema, row: &ExtractedRow) -> Result<TypedRow, ValidationError> {
    let season = row.get("season").and_then(parse_int).map(|s| s as i32);
    let mut typed = TypedRow::default();
    for col in schema.columns {
        let value = validate_column(schema, col, row.get(col.name), season)?;
        typed.push(col.name, value);
    }
    Ok(typed)
}

/// Validate a batch under `policy`. With `SkipInvalid` the error list holds
/// every dropped row; with `FailFast` the first error is returned.
pub fn validate_rows(
    schema: &TableSchema,
    rows: &[ExtractedRow],
    policy: ValidationPolicy,
) -> Result<(Vec<TypedRow>, Vec<ValidationError>), ValidationError> {
    let mut valid = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        match validate_row(schema, row) {
            Ok(typed) => valid.push(typed),
            Err(e) => {
                let e = e.at_row(idx);
                match policy {
                    ValidationPolicy::FailFast => return Err(e),
                    ValidationPolicy::SkipInvalid => {
                        warn!(table = schema.table, row = idx, error = %e, "Skipping invalid row");
                        rejected.push(e);
                    }
                }
            }
        }
    }
    Ok((valid, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::StatCategory;

    fn passing_row() -> ExtractedRow {
        let mut row = ExtractedRow::new();
        row.set("rk", "1");
        row.set("player_name", "Jane Doe");
        row.set("tm", "KAN");
        row.set("att", "597");
        row.set("yds", "4,183");
        row.set("cmp_pct", "67.2");
        row.set("qbr", Value::Null);
        row.set("unknown_extra", "ignored");
        row.set("season", 2023);
        row
    }

    #[test]
    fn test_valid_row_is_typed() {
        let schema = &StatCategory::PassingStats.spec().schema;
        let typed = validate_row(schema, &passing_row()).unwrap();
        assert_eq!(typed.get("season"), Some(&TypedValue::Int(2023)));
        assert_eq!(typed.get("yds"), Some(&TypedValue::Int(4183)));
        assert_eq!(typed.get("cmp_pct"), Some(&TypedValue::Real(67.2)));
        assert_eq!(typed.get("qbr"), Some(&TypedValue::Null));
        assert_eq!(typed.get("player_name"), Some(&TypedValue::Text("Jane Doe".into())));
        assert!(typed.get("unknown_extra").is_none());
    }

    #[test]
    fn test_required_range_and_type_failures() {
        let schema = &StatCategory::PassingStats.spec().schema;

        let mut row = passing_row();
        row.set("tm", Value::Null);
        let err = validate_row(schema, &row).unwrap_err();
        assert_eq!(err.field, "tm");

        let mut row = passing_row();
        row.set("att", "-3");
        assert_eq!(validate_row(schema, &row).unwrap_err().field, "att");

        let mut row = passing_row();
        row.set("cmp_pct", "104.5");
        assert_eq!(validate_row(schema, &row).unwrap_err().field, "cmp_pct");

        let mut row = passing_row();
        row.set("att", "lots");
        assert!(validate_row(schema, &row).unwrap_err().reason.contains("integer"));

        let mut row = passing_row();
        row.set("season", 1899);
        assert_eq!(validate_row(schema, &row).unwrap_err().field, "season");

        let mut row = passing_row();
        row.set("pos", "X".repeat(17));
        assert!(validate_row(schema, &row).unwrap_err().reason.contains("16"));
    }

    #[test]
    fn test_win_pct_bounded_to_one() {
        let schema = &StatCategory::Standings.spec().schema;
        let mut row = ExtractedRow::new();
        row.set("tm", "Kansas City Chiefs");
        row.set("win_pct", ".647");
        row.set("season", 2023);
        assert_eq!(
            validate_row(schema, &row).unwrap().get("win_pct"),
            Some(&TypedValue::Real(0.647))
        );
        row.set("win_pct", "64.7");
        assert!(validate_row(schema, &row).is_err());
    }

    #[test]
    fn test_policies() {
        let schema = &StatCategory::PassingStats.spec().schema;
        let mut bad = passing_row();
        bad.set("player_name", "  ");
        let rows = vec![passing_row(), bad, passing_row()];

        let err = validate_rows(schema, &rows, ValidationPolicy::FailFast).unwrap_err();
        assert_eq!(err.row, Some(1));

        let (valid, rejected) = validate_rows(schema, &rows, ValidationPolicy::SkipInvalid).unwrap();
        assert_eq!(valid.len(), 2);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_game_dates() {
        assert_eq!(
            parse_game_date("2023-09-07", 2023),
            NaiveDate::from_ymd_opt(2023, 9, 7)
        );
        assert_eq!(
            parse_game_date("September 7", 2023),
            NaiveDate::from_ymd_opt(2023, 9, 7)
        );
        assert_eq!(
            parse_game_date("January 7", 2023),
            NaiveDate::from_ymd_opt(2024, 1, 7)
        );
        assert_eq!(parse_game_date("Playoffs", 2023), None);
    }
}
