use crate::domain::model::{OrderStatus, ProductId};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// 在庫不足（利用可能な在庫数を保持する）
    #[error("Insufficient stock for product {product_id}: {available} available")]
    InsufficientStock { product_id: ProductId, available: u32 },
    /// 無効な数量（例: 0の数量で追加しようとした）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 空のカートから注文を作成しようとした
    #[error("Cart is empty")]
    EmptyCart,
    /// 許可されていない注文ステータス遷移（例: 配達済みの注文をキャンセル）
    #[error("Invalid order transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    /// 販売停止中の商品
    #[error("Product is inactive: {0}")]
    ProductInactive(ProductId),
    /// カートに含まれていない商品の数量を変更しようとした
    #[error("Product is not in the cart: {0}")]
    ProductNotInCart(ProductId),
    /// 無効な配送情報（例: 電話番号が空）
    #[error("Invalid delivery details: {0}")]
    InvalidDeliveryDetails(String),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
