pub mod repository;

pub use repository::{OrderStore, SqliteOrderStore};
