pub mod bouts;
pub mod competitions;
pub mod connection;
pub mod events;
pub mod models;
pub mod players;
pub mod points;
pub mod rankings;
pub mod setup;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
