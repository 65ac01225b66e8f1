use crate::domain::error::DomainError;
use crate::domain::model::{Cart, CartLine, CheckoutSummary, Money, Order, OrderLine, Product};
use serde::Serialize;

/// カート明細用のレスポンスDTO
/// 金額は小数点以下2桁の文字列で返す
#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

/// カート用のレスポンスDTO
/// カートがまだ作成されていないユーザーには空のカートを返す
#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: Option<String>,
    pub lines: Vec<CartLineResponse>,
    pub item_count: u32,
    pub total: String,
    pub updated_at: Option<String>,
}

/// カート内の商品点数
#[derive(Serialize)]
pub struct CartCountResponse {
    pub count: u32,
}

/// カートの合計金額
#[derive(Serialize)]
pub struct CartTotalResponse {
    pub total: String,
}

/// 注文確定前の金額プレビュー
#[derive(Serialize)]
pub struct CheckoutSummaryResponse {
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping: bool,
    pub item_count: u32,
    pub line_count: usize,
}

/// 注文一覧用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub status: String,
    pub total: String,
    pub item_count: u32,
    pub created_at: String,
}

/// 注文詳細用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub order_id: String,
    pub user_id: String,
    pub status: String,
    pub created_at: String,
    pub delivery_address: String,
    pub contact_phone: String,
    pub lines: Vec<OrderLineResponse>,
    pub total: String,
}

/// 注文明細用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

/// 商品用のレスポンスDTO
#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub active: bool,
}

impl CartLineResponse {
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price().to_string(),
            subtotal: line.subtotal().to_string(),
        }
    }
}

impl CartResponse {
    /// ドメインオブジェクトからCartResponseを作成
    /// 合計金額が計算できないカートはエラー
    pub fn from_cart(cart: &Cart) -> Result<Self, DomainError> {
        Ok(Self {
            cart_id: Some(cart.id().to_string()),
            lines: cart.lines().iter().map(CartLineResponse::from_line).collect(),
            item_count: cart.item_count(),
            total: cart.total()?.to_string(),
            updated_at: Some(cart.updated_at().to_rfc3339()),
        })
    }

    /// カートが存在しない場合の空のレスポンス
    pub fn empty() -> Self {
        Self {
            cart_id: None,
            lines: Vec::new(),
            item_count: 0,
            total: Money::zero().to_string(),
            updated_at: None,
        }
    }
}

impl CheckoutSummaryResponse {
    pub fn from_summary(summary: &CheckoutSummary) -> Self {
        Self {
            subtotal: summary.subtotal().to_string(),
            shipping: summary.shipping().to_string(),
            total: summary.total().to_string(),
            free_shipping: summary.has_free_shipping(),
            item_count: summary.item_count(),
            line_count: summary.line_count(),
        }
    }
}

impl OrderSummaryResponse {
    /// ドメインオブジェクトからOrderSummaryResponseを作成
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            status: order.status().to_string(),
            total: order.total().to_string(),
            item_count: order.lines().iter().map(OrderLine::quantity).sum(),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

impl OrderDetailResponse {
    /// ドメインオブジェクトからOrderDetailResponseを作成
    /// 合計は注文作成時に固定された値を返す
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status().to_string(),
            created_at: order.created_at().to_rfc3339(),
            delivery_address: order.delivery().address().to_string(),
            contact_phone: order.delivery().contact_phone().to_string(),
            lines: order.lines().iter().map(OrderLineResponse::from_order_line).collect(),
            total: order.total().to_string(),
        }
    }
}

impl OrderLineResponse {
    pub fn from_order_line(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price().to_string(),
            subtotal: line.subtotal().to_string(),
        }
    }
}

impl ProductResponse {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id().to_string(),
            name: product.name().to_string(),
            price: product.price().to_string(),
            stock: product.stock(),
            active: product.is_active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CartId, DeliveryDetails, OrderId, ProductId, UserId};
    use chrono::Utc;

    fn sample_order() -> Order {
        let lines = vec![
            CartLine::new(ProductId::new(), 2, Money::from_cents(1_000)).unwrap(),
            CartLine::new(ProductId::new(), 1, Money::from_cents(2_599)).unwrap(),
        ];
        let delivery = DeliveryDetails::new("Calle Mayor 1".to_string(), "600123456".to_string()).unwrap();
        Order::place(OrderId::new(), UserId::new(), &lines, delivery, Utc::now()).unwrap()
    }

    #[test]
    fn test_order_detail_response_from_order() {
        let order = sample_order();
        let response = OrderDetailResponse::from_order(&order);

        assert_eq!(response.order_id, order.id().to_string());
        assert_eq!(response.status, "CREATED");
        assert_eq!(response.total, "45.99");
        assert_eq!(response.lines.len(), 2);
        assert_eq!(response.lines[0].unit_price, "10.00");
        assert_eq!(response.lines[0].subtotal, "20.00");
    }

    #[test]
    fn test_order_summary_response_counts_items() {
        let order = sample_order();
        let response = OrderSummaryResponse::from_order(&order);

        assert_eq!(response.item_count, 3);
        assert_eq!(response.total, "45.99");
    }

    #[test]
    fn test_cart_response_from_cart() {
        let product = Product::new(ProductId::new(), "Cable".to_string(), Money::from_cents(450), 10);
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());
        cart.add_product(&product, 2, Utc::now()).unwrap();

        let response = CartResponse::from_cart(&cart).unwrap();

        assert_eq!(response.cart_id, Some(cart.id().to_string()));
        assert_eq!(response.item_count, 2);
        assert_eq!(response.total, "9.00");
    }

    #[test]
    fn test_checkout_summary_response_amounts() {
        let product = Product::new(ProductId::new(), "Cable".to_string(), Money::from_cents(2_500), 10);
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());
        cart.add_product(&product, 2, Utc::now()).unwrap();

        let response = CheckoutSummaryResponse::from_summary(&CheckoutSummary::for_cart(&cart).unwrap());

        assert_eq!(response.subtotal, "50.00");
        assert_eq!(response.shipping, "0.00");
        assert_eq!(response.total, "50.00");
        assert!(response.free_shipping);
    }

    #[test]
    fn test_empty_cart_response_serialization() {
        let json = serde_json::to_value(CartResponse::empty()).unwrap();

        assert_eq!(json["cart_id"], serde_json::Value::Null);
        assert_eq!(json["total"], "0.00");
        assert_eq!(json["lines"], serde_json::json!([]));
    }
}
