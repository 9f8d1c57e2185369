pub mod models;
pub mod raw;

pub use models::*;
