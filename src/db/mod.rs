//! Database layer
//!
//! SQLite is the default backend; MySQL is selected through
//! `database.driver`. Repositories hold a `DynDatabasePool` and dispatch on
//! the driver, so services never see the concrete backend.
//!
//! ```ignore
//! use yamdb::config::DatabaseConfig;
//! use yamdb::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, is_unique_violation, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
