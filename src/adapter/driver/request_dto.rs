use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// カートへの商品追加用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// カート明細の数量更新用のリクエストDTO
/// 0以下の数量は明細の削除として扱う
#[derive(Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// 注文作成用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub delivery_address: String,
    pub contact_phone: String,
}

/// 商品登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub price: Decimal, // "25.99" のような文字列
    pub stock: u32,
}

/// 価格変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct ChangePriceRequest {
    pub price: Decimal,
}

/// 販売状態変更用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// 管理用の注文一覧取得のクエリパラメータ
#[derive(Deserialize)]
pub struct AdminOrdersQueryParams {
    pub status: Option<String>,
}
