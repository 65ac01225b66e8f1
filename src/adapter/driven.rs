// 駆動される側アダプター（リポジトリ実装など）

mod cart_repository;
mod catalog_repository;
mod in_memory_store;
mod mysql_store;
mod order_repository;

pub use in_memory_store::{InMemoryStore, InMemoryUnitOfWork};
pub use mysql_store::{MySqlStore, MySqlUnitOfWork};
