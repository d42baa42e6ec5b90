//! Database access layer
//!
//! - `repository`: the `BlogRepository` trait every handler talks to
//! - `postgres_repository`: sqlx implementation over the schema in `migrations/`
//! - `memory_repository`: in-process implementation for tests and demos
//! - `pool`: PostgreSQL pool creation and migrations

pub mod memory_repository;
pub mod pool;
pub mod postgres_repository;
pub mod repository;

pub use memory_repository::MemoryRepository;
pub use pool::{create_pool, migrate};
pub use postgres_repository::PostgresRepository;
pub use repository::BlogRepository;
