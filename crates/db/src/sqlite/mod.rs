//! SQLite-Backend fuer das UserRepository

pub mod pool;
pub mod users;

pub use pool::SqliteDb;
