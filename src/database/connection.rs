use anyhow::{Context, Result};
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    r2d2::Pool::builder()
        .build(manager)
        .context("Failed to create database connection pool")
}

/// In-memory database for tests. Pool size is pinned to one connection
/// so every checkout sees the same database.
pub fn create_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();
    r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .context("Failed to create in-memory database pool")
}

pub fn get_connection(pool: &DbPool) -> Result<DbConn> {
    pool.get()
        .context("Failed to get database connection from pool")
}
