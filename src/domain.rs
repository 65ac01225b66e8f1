// ドメイン層（エンティティ、値オブジェクト、ドメインサービス、ポート）

pub mod error;
pub mod model;
pub mod port;
pub mod service;
