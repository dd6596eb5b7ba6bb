//! Typed column definitions and DDL.
//!
//! Every identifier that reaches SQL is either a `&'static str` from a
//! schema below or the output of [`sanitize_identifier`].

use crate::types::{ExtractedRow, TypedValue};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnKind {
    Int,
    Decimal,
    /// Text with a maximum length in characters.
    Text(usize),
    Date,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Int => "INTEGER",
            ColumnKind::Decimal => "REAL",
            ColumnKind::Text(_) | ColumnKind::Date => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            min: None,
            max: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }
}

/// Non-negative integer count.
pub const fn count(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Int).at_least(0.0)
}

/// Signed integer (differentials, long plays that can be negative).
pub const fn int(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Int)
}

pub const fn decimal(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Decimal)
}

/// Non-negative decimal (averages, half sacks).
pub const fn rate(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Decimal).at_least(0.0)
}

/// Percentage in 0..=100.
pub const fn pct(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Decimal).range(0.0, 100.0)
}

pub const fn text(name: &'static str, max_len: usize) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Text(max_len))
}

pub const fn date(name: &'static str) -> ColumnDef {
    ColumnDef::new(name, ColumnKind::Date)
}

pub const fn season() -> ColumnDef {
    ColumnDef::new("season", ColumnKind::Int)
        .required()
        .range(1920.0, 2100.0)
}

pub const fn week() -> ColumnDef {
    ColumnDef::new("week", ColumnKind::Int).range(0.0, 25.0)
}

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
    /// Composite uniqueness key enforced by the store.
    pub unique: &'static [&'static str],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn create_table_sql(&self) -> String {
        let mut parts = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for col in self.columns {
            let not_null = if col.required { " NOT NULL" } else { "" };
            parts.push(format!("{} {}{}", col.name, col.kind.sql_type(), not_null));
        }
        parts.push("created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
        if !self.unique.is_empty() {
            parts.push(format!("UNIQUE ({})", self.unique.join(", ")));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.table,
            parts.join(",\n    ")
        )
    }
}

/// Lower-case, `[a-z0-9_]` only, no leading digit, never empty.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return "column".to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("c_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Sanitized and double-quoted, safe for dynamic DDL and DML even when the
/// name is a keyword such as `from` or `order`.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", sanitize_identifier(name))
}

/// Strip thousands separators and percent signs before numeric parsing.
pub fn numeric_text(raw: &str) -> String {
    raw.trim().replace([',', '%'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }

    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            SqlType::Integer
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            SqlType::Real
        } else {
            SqlType::Text
        }
    }

    /// Narrowest type that holds every value seen so far plus `value`.
    fn widen(self, value: &Value) -> Self {
        let fits_int = match value {
            Value::Null => return self,
            Value::Number(n) => n.is_i64() || n.is_u64(),
            Value::String(s) => numeric_text(s).parse::<i64>().is_ok(),
            _ => false,
        };
        let fits_real = fits_int
            || match value {
                Value::Number(_) => true,
                Value::String(s) => numeric_text(s).parse::<f64>().is_ok(),
                _ => false,
            };
        match self {
            SqlType::Integer if fits_int => SqlType::Integer,
            SqlType::Integer | SqlType::Real if fits_real => SqlType::Real,
            _ => SqlType::Text,
        }
    }

    /// Convert a raw extracted value for storage in a column of this type.
    pub fn convert(&self, value: &Value) -> TypedValue {
        match value {
            Value::Null => TypedValue::Null,
            Value::Bool(b) => TypedValue::Int(i64::from(*b)),
            Value::Number(n) => match self {
                SqlType::Integer if n.is_i64() => TypedValue::Int(n.as_i64().unwrap_or_default()),
                SqlType::Text => TypedValue::Text(n.to_string()),
                _ => n.as_f64().map(TypedValue::Real).unwrap_or(TypedValue::Null),
            },
            Value::String(s) => {
                let cleaned = numeric_text(s);
                match self {
                    SqlType::Integer => cleaned
                        .parse::<i64>()
                        .map(TypedValue::Int)
                        .unwrap_or_else(|_| TypedValue::Text(s.clone())),
                    SqlType::Real => cleaned
                        .parse::<f64>()
                        .map(TypedValue::Real)
                        .unwrap_or_else(|_| TypedValue::Text(s.clone())),
                    SqlType::Text => TypedValue::Text(s.clone()),
                }
            }
            other => TypedValue::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicColumn {
    pub name: String,
    pub sql_type: SqlType,
}

/// Column list for an ad-hoc table, in first-seen order.
///
/// A column is INTEGER when every non-null value parses as an integer, REAL
/// when every value parses as a number, TEXT otherwise (or when all null).
pub fn infer_columns(rows: &[ExtractedRow]) -> Vec<DynamicColumn> {
    let mut columns: Vec<(String, Option<SqlType>)> = Vec::new();

    for row in rows {
        for (key, value) in row.iter() {
            let name = sanitize_identifier(key);
            let idx = match columns.iter().position(|(n, _)| *n == name) {
                Some(idx) => idx,
                None => {
                    columns.push((name, None));
                    columns.len() - 1
                }
            };
            let slot = &mut columns[idx].1;
            if !value.is_null() {
                *slot = Some(slot.unwrap_or(SqlType::Integer).widen(value));
            }
        }
    }

    columns
        .into_iter()
        .map(|(name, sql_type)| DynamicColumn {
            name,
            sql_type: sql_type.unwrap_or(SqlType::Text),
        })
        .collect()
}

pub fn create_dynamic_table_sql(table: &str, columns: &[DynamicColumn]) -> String {
    let mut parts = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    parts.extend(
        columns
            .iter()
            .filter(|c| c.name != "id")
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.sql_type.as_sql())),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table),
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Player Name"), "player_name");
        assert_eq!(sanitize_identifier("Yds/G"), "yds_g");
        assert_eq!(sanitize_identifier("1st Downs"), "c_1st_downs");
        assert_eq!(sanitize_identifier("x; DROP TABLE t;--"), "x_drop_table_t");
        assert_eq!(sanitize_identifier("%%"), "column");
        assert_eq!(sanitize_identifier("Cmp%"), "cmp");
        let once = sanitize_identifier("Team Stats (Offense)");
        assert_eq!(sanitize_identifier(&once), once);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Order"), "\"order\"");
        assert_eq!(quote_identifier("x\"; DROP TABLE t;--"), "\"x_drop_table_t\"");
    }

    #[test]
    fn test_dynamic_ddl_quotes_keyword_columns() {
        let columns = vec![
            DynamicColumn { name: "From".into(), sql_type: SqlType::Integer },
            DynamicColumn { name: "group".into(), sql_type: SqlType::Text },
        ];
        assert_eq!(
            create_dynamic_table_sql("scraped_drafts", &columns),
            "CREATE TABLE IF NOT EXISTS \"scraped_drafts\" (id INTEGER PRIMARY KEY AUTOINCREMENT, \"from\" INTEGER, \"group\" TEXT)"
        );
    }

    #[test]
    fn test_infer_columns() {
        let mut a = ExtractedRow::new();
        a.set("Yds", "1,204");
        a.set("Avg", "4.5");
        a.set("Name", "Jane Doe");
        a.set("Blank", Value::Null);
        let mut b = ExtractedRow::new();
        b.set("Yds", "87");
        b.set("Avg", "12");
        b.set("Name", "12");

        let cols = infer_columns(&[a, b]);
        let summary: Vec<(&str, SqlType)> =
            cols.iter().map(|c| (c.name.as_str(), c.sql_type)).collect();
        assert_eq!(
            summary,
            vec![
                ("yds", SqlType::Integer),
                ("avg", SqlType::Real),
                ("name", SqlType::Text),
                ("blank", SqlType::Text),
            ]
        );
    }

    #[test]
    fn test_convert_values() {
        assert_eq!(SqlType::Integer.convert(&Value::from("1,204")), TypedValue::Int(1204));
        assert_eq!(SqlType::Real.convert(&Value::from("67.2%")), TypedValue::Real(67.2));
        assert_eq!(SqlType::Text.convert(&Value::from(2023)), TypedValue::Text("2023".into()));
        assert_eq!(SqlType::Integer.convert(&Value::Null), TypedValue::Null);
    }

    #[test]
    fn test_create_table_sql_has_unique_key() {
        const COLUMNS: &[ColumnDef] = &[text("tm", 64).required(), season(), count("g")];
        let schema = TableSchema {
            table: "demo",
            columns: COLUMNS,
            unique: &["tm", "season"],
        };
        let sql = schema.create_table_sql();
        assert!(sql.contains("tm TEXT NOT NULL"));
        assert!(sql.contains("g INTEGER"));
        assert!(sql.contains("UNIQUE (tm, season)"));
    }
}
