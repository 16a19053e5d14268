use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::path::Path;

/// A workbook of named, ordered sheets. Each sheet is a list of rows of
/// string cells; row 0 is the header row.
pub struct Workbook {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn encode_cells(cells: &[String]) -> Result<String> {
    serde_json::to_string(cells).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn decode_cells(json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

impl Workbook {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let wb = Workbook { conn };
        wb.init_schema()?;
        Ok(wb)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let wb = Workbook { conn };
        wb.init_schema()?;
        Ok(wb)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sheets (
                name TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sheet_rows (
                sheet TEXT NOT NULL,
                row_index INTEGER NOT NULL,
                cells TEXT NOT NULL,      -- JSON array of strings
                PRIMARY KEY(sheet, row_index),
                FOREIGN KEY(sheet) REFERENCES sheets(name) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sheets_position ON sheets(position);
            ",
        )?;
        Ok(())
    }

    // Sheet management
    pub fn sheet_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sheets ORDER BY position, name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>>>()?;
        Ok(names)
    }

    pub fn has_sheet(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM sheets WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert an empty sheet at `position`, shifting later sheets right.
    /// Positions past the end append. Does nothing if the sheet exists.
    pub fn insert_sheet(&self, name: &str, position: usize) -> Result<()> {
        if self.has_sheet(name)? {
            return Ok(());
        }
        let count = self.sheet_names()?.len();
        let position = position.min(count) as i64;

        self.conn.execute(
            "UPDATE sheets SET position = position + 1 WHERE position >= ?1",
            params![position],
        )?;
        self.conn.execute(
            "INSERT INTO sheets (name, position, created_at) VALUES (?1, ?2, ?3)",
            params![name, position, current_timestamp()],
        )?;
        tracing::debug!("Inserted sheet {} at position {}", name, position);
        Ok(())
    }

    pub fn delete_sheet(&self, name: &str) -> Result<()> {
        let position: Option<i64> = self
            .conn
            .query_row(
                "SELECT position FROM sheets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(position) = position else {
            return Ok(());
        };

        self.conn
            .execute("DELETE FROM sheets WHERE name = ?1", params![name])?;
        self.conn.execute(
            "UPDATE sheets SET position = position - 1 WHERE position > ?1",
            params![position],
        )?;
        tracing::debug!("Deleted sheet {}", name);
        Ok(())
    }

    /// Remove every row of a sheet, header included.
    pub fn clear_sheet(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sheet_rows WHERE sheet = ?1", params![name])?;
        Ok(())
    }

    // Row operations
    pub fn row_count(&self, sheet: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(row_index) + 1, 0) FROM sheet_rows WHERE sheet = ?1",
            params![sheet],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn get_row(&self, sheet: &str, row_index: usize) -> Result<Vec<String>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT cells FROM sheet_rows WHERE sheet = ?1 AND row_index = ?2",
                params![sheet, row_index as i64],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => decode_cells(&json),
            None => Ok(Vec::new()),
        }
    }

    /// The full data range of a sheet. Every row is padded to the width of
    /// the widest row, so the result is rectangular.
    pub fn get_values(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_index, cells FROM sheet_rows WHERE sheet = ?1 ORDER BY row_index",
        )?;
        let stored = stmt
            .query_map(params![sheet], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>>>()?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (index, json) in stored {
            // Gaps left by set_row past the end read as empty rows
            while rows.len() < index as usize {
                rows.push(Vec::new());
            }
            rows.push(decode_cells(&json)?);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Ok(rows)
    }

    pub fn set_row(&self, sheet: &str, row_index: usize, cells: &[String]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sheet_rows (sheet, row_index, cells) VALUES (?1, ?2, ?3)
             ON CONFLICT(sheet, row_index) DO UPDATE SET cells = excluded.cells",
            params![sheet, row_index as i64, encode_cells(cells)?],
        )?;
        Ok(())
    }

    /// Append a row after the last one and return its index.
    pub fn append_row(&self, sheet: &str, cells: &[String]) -> Result<usize> {
        let index = self.row_count(sheet)?;
        self.set_row(sheet, index, cells)?;
        Ok(index)
    }

    /// Write a single cell, growing the row as needed.
    pub fn set_cell(&self, sheet: &str, row_index: usize, column: usize, value: &str) -> Result<()> {
        let mut row = self.get_row(sheet, row_index)?;
        if row.len() <= column {
            row.resize(column + 1, String::new());
        }
        row[column] = value.to_string();
        self.set_row(sheet, row_index, &row)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
