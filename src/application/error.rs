use crate::domain::error::DomainError;
use crate::domain::model::{OrderId, ProductId, UserId};
use crate::domain::port::RepositoryError;
use crate::domain::service::StockLedgerError;

use std::fmt;

/// 見つからなかったリソース
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// ユーザーのカート
    Cart(UserId),
    Product(ProductId),
    Order(OrderId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Cart(user_id) => write!(f, "cart of user {}", user_id),
            Resource::Product(product_id) => write!(f, "product {}", product_id),
            Resource::Order(order_id) => write!(f, "order {}", order_id),
        }
    }
}

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラーをラップし、存在しないリソースと権限エラーを区別する
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(Resource),
    /// 要求者がリソースの所有者ではない
    #[error("User {requester} is not allowed to act on order {order_id}")]
    AuthorizationFailure { requester: UserId, order_id: OrderId },
}

impl From<StockLedgerError> for ApplicationError {
    fn from(err: StockLedgerError) -> Self {
        match err {
            StockLedgerError::Domain(err) => ApplicationError::Domain(err),
            StockLedgerError::Repository(err) => ApplicationError::Repository(err),
            StockLedgerError::ProductMissing(product_id) => {
                ApplicationError::NotFound(Resource::Product(product_id))
            }
        }
    }
}
