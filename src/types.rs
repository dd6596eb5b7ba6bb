use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// One table row after column mapping: normalized field name to raw value.
///
/// Field order follows the source table, with context fields (`season`,
/// `week`, `team`) appended last. Values are JSON strings, numbers for the
/// injected context, or null for blank cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRow {
    fields: Vec<(String, Value)>,
}

impl ExtractedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text value of a field; `None` for missing, null or non-string fields.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets `key`, replacing an earlier value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ExtractedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Values the caller supplies for every row; never read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractContext {
    pub season: i32,
    pub week: Option<i32>,
    pub team: Option<String>,
}

impl ExtractContext {
    pub fn season(season: i32) -> Self {
        Self {
            season,
            week: None,
            team: None,
        }
    }

    pub fn with_week(mut self, week: i32) -> Self {
        self.week = Some(week);
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }
}

/// A validated column value ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl TypedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Null => Value::Null,
            TypedValue::Int(i) => Value::from(*i),
            TypedValue::Real(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl ToSql for TypedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            TypedValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            TypedValue::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            TypedValue::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            TypedValue::Text(s) => ToSqlOutput::Owned(SqlValue::Text(s.clone())),
        })
    }
}

impl From<SqlValue> for TypedValue {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => TypedValue::Null,
            SqlValue::Integer(i) => TypedValue::Int(i),
            SqlValue::Real(f) => TypedValue::Real(f),
            SqlValue::Text(s) => TypedValue::Text(s),
            SqlValue::Blob(b) => TypedValue::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

/// Typed columns of one record, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedRow {
    pub columns: Vec<(String, TypedValue)>,
}

impl TypedRow {
    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn push(&mut self, column: impl Into<String>, value: TypedValue) {
        self.columns.push((column.into(), value));
    }
}

/// A persisted row as returned to callers.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl StoredRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracted_row_keeps_order_and_replaces_in_place() {
        let mut row = ExtractedRow::new();
        row.set("player_name", "Jane Doe");
        row.set("tm", "KAN");
        row.set("player_name", "Jane Roe");

        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["player_name", "tm"]);
        assert_eq!(row.get_str("player_name"), Some("Jane Roe"));
        assert_eq!(serde_json::to_value(&row).unwrap(), json!({"player_name": "Jane Roe", "tm": "KAN"}));
    }

    #[test]
    fn test_stored_record_flattens_fields() {
        let mut fields = serde_json::Map::new();
        fields.insert("tm".into(), json!("KAN"));
        let record = StoredRecord { id: 7, fields };
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": 7, "tm": "KAN"}));
    }
}
