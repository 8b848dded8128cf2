//! Batched INSERT emission for generated tables.

use crate::model::DatasetBundle;
use crate::value::Row;
use std::io::{self, Write};

/// Rendering options for a whole dataset
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Overrides every table's default batch size when set
    pub batch_size: Option<usize>,
    /// Write the file header naming the seed
    pub include_header: bool,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self {
            batch_size: None,
            include_header: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Counts from a render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub tables: usize,
    pub statements: usize,
    pub rows: usize,
}

/// Renders a [`DatasetBundle`] as a SQL load script
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render<W: Write>(&self, bundle: &DatasetBundle, writer: &mut W) -> io::Result<RenderStats> {
        let mut stats = RenderStats::default();

        if self.config.include_header {
            writeln!(writer, "-- Hospital dataset load script")?;
            writeln!(writer, "-- Seed: {}", bundle.seed)?;
            writeln!(writer)?;
        }

        for table in bundle.tables() {
            if table.is_empty() {
                continue;
            }
            let batch_size = self.config.batch_size.unwrap_or(table.batch_size);
            stats.statements += write_insert_batches(
                writer,
                table.table_name,
                table.columns,
                &table.rows,
                batch_size,
            )?;
            stats.rows += table.rows.len();
            stats.tables += 1;
        }

        writer.flush()?;
        Ok(stats)
    }

    pub fn render_to_string(&self, bundle: &DatasetBundle) -> io::Result<String> {
        let mut buf = Vec::new();
        self.render(bundle, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Emit one table's rows as batched INSERT statements.
pub fn emit(table_name: &str, columns: &[&str], rows: &[Row], batch_size: usize) -> String {
    let mut sql: String = InsertBatches::new(table_name, columns, rows, batch_size).collect();
    if !sql.is_empty() {
        sql.push('\n');
    }
    sql
}

/// Stream one table's rows as batched INSERT statements.
///
/// Returns the number of statements written. An empty row set writes nothing.
pub fn write_insert_batches<W: Write>(
    writer: &mut W,
    table_name: &str,
    columns: &[&str],
    rows: &[Row],
    batch_size: usize,
) -> io::Result<usize> {
    let mut statements = 0;
    for batch in InsertBatches::new(table_name, columns, rows, batch_size) {
        writer.write_all(batch.as_bytes())?;
        statements += 1;
    }
    if statements > 0 {
        writeln!(writer)?;
    }
    Ok(statements)
}

/// One INSERT statement per chunk of rows; the first carries the
/// `-- Insert into` header
struct InsertBatches<'a> {
    table_name: &'a str,
    column_list: String,
    chunks: std::slice::Chunks<'a, Row>,
    started: bool,
}

impl<'a> InsertBatches<'a> {
    fn new(table_name: &'a str, columns: &[&str], rows: &'a [Row], batch_size: usize) -> Self {
        Self {
            table_name,
            column_list: columns.join(", "),
            chunks: rows.chunks(batch_size.max(1)),
            started: false,
        }
    }
}

impl Iterator for InsertBatches<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let chunk = self.chunks.next()?;

        let mut out = String::new();
        if !self.started {
            self.started = true;
            out.push_str(&format!("-- Insert into {}\n", self.table_name));
        }
        out.push_str(&format!(
            "INSERT INTO {} ({}) VALUES\n",
            self.table_name, self.column_list
        ));
        for (i, row) in chunk.iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| v.to_sql_literal()).collect();
            let terminator = if i + 1 == chunk.len() { ";" } else { "," };
            out.push_str(&format!("({}){}\n", values.join(", "), terminator));
        }
        Some(out)
    }
}
