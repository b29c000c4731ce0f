// Database layer module: PostgreSQL connection pool and repositories

pub mod pool;
pub mod repositories;

pub use pool::DbPool;
