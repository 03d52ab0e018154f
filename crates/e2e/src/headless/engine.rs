//! SQLite databases behind the headless playground

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection};
use tracing::debug;

use crate::error::E2eResult;

/// Rows returned by the last statement of a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    /// Header line followed by one tab-separated line per row
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.columns.join("\t"));
        lines.extend(self.rows.iter().map(|row| row.join("\t")));
        lines.join("\n")
    }

    /// Row count as the status line shows it
    pub fn describe(&self) -> String {
        match self.rows.len() {
            1 => "1 row".to_string(),
            n => format!("{} rows", n),
        }
    }
}

/// An in-memory database with a display name
pub struct Database {
    pub name: String,
    conn: Connection,
}

impl Database {
    /// Create `name` and run `schema` against it
    pub fn open(name: impl Into<String>, schema: &str) -> E2eResult<Self> {
        let name = name.into();
        let conn = Connection::open_in_memory()?;
        if !schema.trim().is_empty() {
            conn.execute_batch(schema)?;
        }
        debug!("Opened headless database {}", name);
        Ok(Self { name, conn })
    }

    /// Run every statement in `sql`; returns the last result set, if any
    pub fn execute(&self, sql: &str) -> E2eResult<Option<ResultSet>> {
        let mut batch = Batch::new(&self.conn, sql);
        let mut last = None;

        while let Some(mut stmt) = batch.next()? {
            if stmt.column_count() == 0 {
                stmt.execute([])?;
                continue;
            }

            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = Vec::new();
            let mut cursor = stmt.query([])?;
            while let Some(row) = cursor.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for i in 0..columns.len() {
                    values.push(display_value(row.get_ref(i)?));
                }
                rows.push(values);
            }
            last = Some(ResultSet { columns, rows });
        }

        Ok(last)
    }

    /// User tables, sorted by name
    pub fn tables(&self) -> E2eResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "select name from sqlite_master \
             where type = 'table' and name not like 'sqlite_%' order by name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// `(name, declared type)` for each column of `table`
    pub fn columns(&self, table: &str) -> E2eResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("select name, type from pragma_table_info(?1) order by cid")?;
        let columns = stmt
            .query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// SQL that recreates the schema and data; empty for an empty database
    pub fn dump(&self) -> E2eResult<String> {
        let mut out = Vec::new();

        let mut stmt = self.conn.prepare(
            "select name, sql from sqlite_master \
             where type = 'table' and name not like 'sqlite_%' and sql is not null \
             order by rowid",
        )?;
        let tables = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        for (table, create) in tables {
            out.push(format!("{};", create));

            let mut select = self.conn.prepare(&format!("select * from {}", quote_ident(&table)))?;
            let width = select.column_count();
            let mut cursor = select.query([])?;
            while let Some(row) = cursor.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(sql_literal(row.get_ref(i)?));
                }
                out.push(format!(
                    "insert into {} values ({});",
                    quote_ident(&table),
                    values.join(", ")
                ));
            }
        }

        let mut stmt = self.conn.prepare(
            "select sql from sqlite_master \
             where type in ('index', 'view', 'trigger') and sql is not null order by rowid",
        )?;
        let extras = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        out.extend(extras.into_iter().map(|sql| format!("{};", sql)));

        Ok(out.join("\n"))
    }
}

fn display_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("({} bytes)", b.len()),
    }
}

fn sql_literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => format!("{:?}", f),
        ValueRef::Text(t) => format!("'{}'", String::from_utf8_lossy(t).replace('\'', "''")),
        ValueRef::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
            format!("X'{}'", hex)
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
