use anyhow::{Context, Result};

use super::connection::DbConn;

/// Apply the schema. Every statement is IF NOT EXISTS, so running this
/// against an existing database is a no-op and re-ingestion keeps its
/// idempotence guarantees.
pub fn init_database(conn: &mut DbConn) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute schema statement {}", idx + 1))?;
    }

    log::info!("Database schema initialized");
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &mut DbConn, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}
