// アプリケーション層（ユースケースとトランザクション境界）

pub mod error;
pub mod service;

pub use error::{ApplicationError, Resource};
