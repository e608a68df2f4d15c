pub mod connection;
pub mod migrations;

pub use connection::{DatabaseManager, get_database_pool};
pub use migrations::{MigrationManager, MigrationRecord, run_migrations};
