use crate::categories::StatCategory;
use crate::error::{Result, ScraperError};
use crate::gamelog::TEAM_GAME_SCHEMA;
use crate::odds::ODDS_SCHEMA;
use crate::schema::{
    create_dynamic_table_sql, quote_identifier, sanitize_identifier, DynamicColumn, SqlType, TableSchema,
};
use crate::types::{ExtractedRow, StoredRecord, TypedRow, TypedValue};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Largest page any listing query returns.
pub const MAX_PAGE_SIZE: u32 = 200;

static NULL_VALUE: TypedValue = TypedValue::Null;

const METADATA_TABLE: &str = "scraped_data_metadata";

const METADATA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS scraped_data_metadata (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    source_url   TEXT NOT NULL,
    table_id     TEXT NOT NULL,
    table_name   TEXT,
    scraped_at   TEXT NOT NULL,
    season       INTEGER,
    entity_type  TEXT,
    table_type   TEXT,
    rows_scraped INTEGER NOT NULL DEFAULT 0,
    source_type  TEXT
);
CREATE INDEX IF NOT EXISTS idx_scraped_data_metadata_url ON scraped_data_metadata (source_url);
"#;

/// True for any table `Database::migrate` owns, and for SQLite's internal tables.
/// Ad-hoc tables may never take these names.
pub fn is_reserved_table(name: &str) -> bool {
    let name = sanitize_identifier(name);
    name.starts_with("sqlite_")
        || StatCategory::ALL
            .iter()
            .map(|c| c.spec().schema.table)
            .chain([TEAM_GAME_SCHEMA.table, ODDS_SCHEMA.table, METADATA_TABLE])
            .any(|t| t == name)
}

fn ensure_not_reserved(table: &str) -> Result<()> {
    if is_reserved_table(table) {
        return Err(ScraperError::Config(format!(
            "table name '{table}' is reserved for the store"
        )));
    }
    Ok(())
}

/// One row of `scraped_data_metadata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedTableMeta {
    pub source_url: String,
    pub table_id: String,
    pub table_name: String,
    pub scraped_at: String,
    pub season: Option<i32>,
    pub entity_type: Option<String>,
    pub table_type: Option<String>,
    pub rows_scraped: usize,
    pub source_type: String,
}

/// Sort and paging for season listings.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub descending: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// SQLite store. A single connection behind a mutex; all statements are short.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create every known table. Idempotent.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn();
        for category in StatCategory::ALL {
            conn.execute_batch(&category.spec().schema.create_table_sql())?;
        }
        conn.execute_batch(&TEAM_GAME_SCHEMA.create_table_sql())?;
        conn.execute_batch(&ODDS_SCHEMA.create_table_sql())?;
        conn.execute_batch(METADATA_DDL)?;
        Ok(())
    }

    // ---- typed tables ----

    /// Append all rows in one transaction. Any failure, including a
    /// uniqueness violation, rolls the whole batch back.
    pub fn insert_records(&self, schema: &TableSchema, rows: &[TypedRow]) -> Result<Vec<StoredRecord>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(rows.len());

        for row in rows {
            tx.execute(&insert_sql(schema.table, row, false), params_from_iter(row.columns.iter().map(|(_, v)| v)))
                .map_err(|e| ScraperError::from(e).in_table(schema.table))?;
            stored.push(record_from_typed(tx.last_insert_rowid(), row));
        }

        tx.commit()?;
        debug!(table = schema.table, rows = stored.len(), "Inserted records");
        Ok(stored)
    }

    /// Insert rows whose unique key is new; rows already stored are returned
    /// as they exist in the table.
    pub fn insert_or_skip(&self, schema: &TableSchema, rows: &[TypedRow]) -> Result<Vec<StoredRecord>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(rows.len());

        for row in rows {
            let changed = tx
                .execute(&insert_sql(schema.table, row, true), params_from_iter(row.columns.iter().map(|(_, v)| v)))
                .map_err(|e| ScraperError::from(e).in_table(schema.table))?;
            if changed > 0 {
                stored.push(record_from_typed(tx.last_insert_rowid(), row));
                continue;
            }

            let key_values: Vec<&TypedValue> = schema
                .unique
                .iter()
                .map(|k| row.get(k).unwrap_or(&NULL_VALUE))
                .collect();
            let predicate = schema
                .unique
                .iter()
                .enumerate()
                .map(|(i, k)| format!("{k} IS ?{}", i + 1))
                .collect::<Vec<_>>()
                .join(" AND ");
            let sql = format!("SELECT * FROM {} WHERE {predicate} LIMIT 1", schema.table);
            let existing = tx
                .query_row(&sql, params_from_iter(key_values), record_from_row)
                .optional()?;
            if let Some(record) = existing {
                stored.push(record);
            }
        }

        tx.commit()?;
        Ok(stored)
    }

    /// Page of one season's rows. `sort` must name a schema column; anything
    /// else falls back to insertion order.
    pub fn list_by_season(&self, schema: &TableSchema, season: i32, query: &ListQuery) -> Result<Vec<StoredRecord>> {
        let order_col = query
            .sort
            .as_deref()
            .and_then(|s| schema.column(s).map(|c| c.name))
            .unwrap_or("id");
        let direction = if query.descending { "DESC" } else { "ASC" };
        let limit = query.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0);

        let sql = format!(
            "SELECT * FROM {} WHERE season = ?1 ORDER BY {order_col} {direction}, id ASC LIMIT ?2 OFFSET ?3",
            schema.table
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![season, limit, offset], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_by_season(&self, schema: &TableSchema, season: i32) -> Result<i64> {
        let conn = self.conn();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE season = ?1", schema.table),
            params![season],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Team row matched case-insensitively on `tm`.
    pub fn find_team(&self, schema: &TableSchema, season: i32, team: &str) -> Result<Option<StoredRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE season = ?1 AND lower(tm) = lower(?2) LIMIT 1",
                    schema.table
                ),
                params![season, team.trim()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Case-insensitive substring match on `player_name` in one player table.
    pub fn search_players(&self, schema: &TableSchema, season: i32, name: &str, limit: u32) -> Result<Vec<StoredRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE season = ?1 AND instr(lower(player_name), lower(?2)) > 0 ORDER BY player_name LIMIT ?3",
            schema.table
        ))?;
        let rows = stmt.query_map(
            params![season, name.trim(), limit.clamp(1, MAX_PAGE_SIZE)],
            record_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_games(&self, schema: &TableSchema, season: i32, week: Option<i32>) -> Result<Vec<StoredRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE season = ?1 AND (?2 IS NULL OR week = ?2) ORDER BY week, id",
            schema.table
        ))?;
        let rows = stmt.query_map(params![season, week], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Latest closing line for a team (home or away), optionally for one book.
    pub fn latest_closing_line(
        &self,
        season: i32,
        week: i32,
        team: &str,
        sportsbook: Option<&str>,
    ) -> Result<Option<StoredRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE season = ?1 AND week = ?2 AND is_closing = 1 \
                     AND (upper(home_team) = upper(?3) OR upper(away_team) = upper(?3)) \
                     AND (?4 IS NULL OR lower(sportsbook) = lower(?4)) \
                     ORDER BY timestamp DESC, id DESC LIMIT 1",
                    ODDS_SCHEMA.table
                ),
                params![season, week, team.trim(), sportsbook],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    // ---- ad-hoc tables ----

    pub fn table_columns(&self, table: &str) -> Result<Vec<DynamicColumn>> {
        let table = sanitize_identifier(table);
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(&table)))?;
        let cols = stmt.query_map([], |r| {
            let name: String = r.get(1)?;
            let declared: String = r.get(2)?;
            Ok(DynamicColumn {
                name,
                sql_type: SqlType::from_declared(&declared),
            })
        })?;
        Ok(cols.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Create `table` from `columns`, or add whichever columns it lacks.
    /// Returns the table's resulting column list.
    pub fn ensure_dynamic_table(&self, table: &str, columns: &[DynamicColumn]) -> Result<Vec<DynamicColumn>> {
        let table = sanitize_identifier(table);
        ensure_not_reserved(&table)?;
        let existing = self.table_columns(&table)?;

        if existing.is_empty() {
            self.conn().execute_batch(&create_dynamic_table_sql(&table, columns))?;
            info!(table = %table, columns = columns.len(), "Created table");
        } else {
            let conn = self.conn();
            for col in columns {
                let name = sanitize_identifier(&col.name);
                if !existing.iter().any(|c| c.name == name) {
                    conn.execute_batch(&format!(
                        "ALTER TABLE {} ADD COLUMN {} {}",
                        quote_identifier(&table),
                        quote_identifier(&name),
                        col.sql_type.as_sql()
                    ))?;
                    debug!(table = %table, column = %name, "Added column");
                }
            }
        }
        self.table_columns(&table)
    }

    /// Delete every row carrying `source_url`, then insert `rows`, atomically.
    pub fn replace_rows_for_source(&self, table: &str, source_url: &str, rows: &[ExtractedRow]) -> Result<usize> {
        let table = sanitize_identifier(table);
        ensure_not_reserved(&table)?;
        let columns = self.table_columns(&table)?;
        let quoted = quote_identifier(&table);

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let deleted = tx
            .execute(&format!("DELETE FROM {quoted} WHERE source_url = ?1"), params![source_url])
            .map_err(|e| ScraperError::from(e).in_table(&table))?;
        if deleted > 0 {
            debug!(table = %table, deleted, "Removed previous rows for source");
        }

        let mut inserted = 0;
        for row in rows {
            let mut names = Vec::new();
            let mut values = Vec::new();
            for (key, value) in row.iter() {
                let name = sanitize_identifier(key);
                if name == "id" || names.contains(&name) {
                    continue;
                }
                let Some(col) = columns.iter().find(|c| c.name == name) else {
                    continue;
                };
                values.push(col.sql_type.convert(value));
                names.push(name);
            }
            if names.is_empty() {
                continue;
            }
            let placeholders = (1..=names.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
            let quoted_names = names.iter().map(|n| quote_identifier(n)).collect::<Vec<_>>().join(", ");
            tx.execute(
                &format!("INSERT INTO {quoted} ({quoted_names}) VALUES ({placeholders})"),
                params_from_iter(values.iter()),
            )
            .map_err(|e| ScraperError::from(e).in_table(&table))?;
            inserted += 1;
        }

        tx.commit()?;
        Ok(inserted)
    }

    pub fn count_rows_for_source(&self, table: &str, source_url: &str) -> Result<i64> {
        let table = sanitize_identifier(table);
        let conn = self.conn();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE source_url = ?1", quote_identifier(&table)),
            params![source_url],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    pub fn track_scraped(&self, meta: &ScrapedTableMeta) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO scraped_data_metadata
                (source_url, table_id, table_name, scraped_at, season, entity_type, table_type, rows_scraped, source_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                meta.source_url,
                meta.table_id,
                meta.table_name,
                meta.scraped_at,
                meta.season,
                meta.entity_type,
                meta.table_type,
                meta.rows_scraped as i64,
                meta.source_type,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn scraped_metadata_for(&self, source_url: &str) -> Result<Vec<StoredRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM scraped_data_metadata WHERE source_url = ?1 ORDER BY scraped_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![source_url], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn insert_sql(table: &str, row: &TypedRow, or_ignore: bool) -> String {
    let names: Vec<&str> = row.columns.iter().map(|(c, _)| c.as_str()).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT {}INTO {table} ({}) VALUES ({})",
        if or_ignore { "OR IGNORE " } else { "" },
        names.join(", "),
        placeholders.join(", ")
    )
}

fn record_from_typed(id: i64, row: &TypedRow) -> StoredRecord {
    StoredRecord {
        id,
        fields: row
            .columns
            .iter()
            .map(|(c, v)| (c.clone(), v.to_json()))
            .collect(),
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let names: Vec<String> = row
        .as_ref()
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut id = 0;
    let mut fields = serde_json::Map::new();
    for (idx, name) in names.into_iter().enumerate() {
        let value: SqlValue = row.get(idx)?;
        if name == "id" {
            if let SqlValue::Integer(v) = value {
                id = v;
            }
            continue;
        }
        fields.insert(name, TypedValue::from(value).to_json());
    }
    Ok(StoredRecord { id, fields })
}
