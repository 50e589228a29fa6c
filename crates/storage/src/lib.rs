pub mod db;
pub mod repository;

pub use db::{create_db, DbPool};
pub use repository::{SqliteRepository, StoredTransaction};
