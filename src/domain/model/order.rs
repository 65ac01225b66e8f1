use crate::domain::error::DomainError;
use crate::domain::model::{CartLine, DeliveryDetails, Money, OrderId, OrderStatus, ProductId, UserId};
use chrono::{DateTime, Utc};

/// 注文明細を表す値オブジェクト
/// 注文作成時にカート明細から一度だけコピーされ、以後変更されない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
}

impl OrderLine {
    /// 新しい注文明細を作成
    /// 数量は1以上で、小計が金額の範囲に収まる必要がある
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let subtotal = unit_price.multiply(quantity)?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }

    /// 商品IDを取得
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// 数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 単価を取得
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// 小計（単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}

// カート明細は作成時に小計を検証済み
impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
            subtotal: line.subtotal(),
        }
    }
}

/// カート明細のリストから注文明細のスナップショットを作成する
/// 結果はカートへの参照を持たない
pub fn snapshot_lines(cart_lines: &[CartLine]) -> Vec<OrderLine> {
    cart_lines.iter().map(OrderLine::from).collect()
}

/// Order集約
/// 作成後は明細と合計金額が固定され、ステータスのみ遷移する
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    delivery: DeliveryDetails,
    status: OrderStatus,
    total: Money,
    lines: Vec<OrderLine>,
}

impl Order {
    /// カート明細から新しい注文を作成
    /// 合計金額はカートが保持する単価で計算し、作成時点で固定する
    ///
    /// 事前条件:
    /// - 明細が1つ以上
    /// - 合計が金額の範囲に収まる
    pub fn place(
        id: OrderId,
        user_id: UserId,
        cart_lines: &[CartLine],
        delivery: DeliveryDetails,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if cart_lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let lines = snapshot_lines(cart_lines);
        let total = Self::sum_lines(&lines)?;

        Ok(Self {
            id,
            user_id,
            created_at,
            delivery,
            status: OrderStatus::Created,
            total,
            lines,
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// 合計金額は保存された値をそのまま使い、再計算しない
    pub fn reconstruct(
        id: OrderId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        delivery: DeliveryDetails,
        status: OrderStatus,
        total: Money,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            delivery,
            status,
            total,
            lines,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    /// 購入者のユーザーIDを取得
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// 作成時に固定された合計金額
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// 指定されたユーザーの注文かどうか
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// 注文をキャンセル
    /// 事前条件:
    /// - ステータスがCreated
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Cancelled)
    }

    /// 注文を配達完了にマーク
    /// 事前条件:
    /// - ステータスがCreated
    pub fn mark_delivered(&mut self) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Delivered)
    }

    fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if self.status != OrderStatus::Created {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn sum_lines(lines: &[OrderLine]) -> Result<Money, DomainError> {
        lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.add(&line.subtotal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn delivery() -> DeliveryDetails {
        DeliveryDetails::new("Av. Siempre Viva 742".to_string(), "600123456".to_string()).unwrap()
    }

    fn cart_line(price_cents: u32, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(), quantity, Money::from_cents(price_cents)).unwrap()
    }

    fn placed_order() -> Order {
        Order::place(
            OrderId::new(),
            UserId::new(),
            &[cart_line(1_000, 2)],
            delivery(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_place_order_from_cart_lines() {
        let lines = vec![cart_line(1_000, 2), cart_line(2_599, 1)];
        let order = Order::place(OrderId::new(), UserId::new(), &lines, delivery(), Utc::now()).unwrap();

        assert_eq!(order.status(), OrderStatus::Created);
        assert_eq!(order.total().amount(), Decimal::new(4_599, 2));
        assert_eq!(order.lines().len(), 2);
        for (order_line, cart_line) in order.lines().iter().zip(&lines) {
            assert_eq!(order_line.product_id(), cart_line.product_id());
            assert_eq!(order_line.quantity(), cart_line.quantity());
            assert_eq!(order_line.unit_price(), cart_line.unit_price());
        }
    }

    #[test]
    fn test_place_order_with_no_lines_fails() {
        let result = Order::place(OrderId::new(), UserId::new(), &[], delivery(), Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::EmptyCart);
    }

    #[test]
    fn test_snapshot_lines_preserves_order() {
        let lines = vec![cart_line(100, 1), cart_line(200, 2), cart_line(300, 3)];
        let snapshot = snapshot_lines(&lines);
        let quantities: Vec<u32> = snapshot.iter().map(OrderLine::quantity).collect();
        assert_eq!(quantities, vec![1, 2, 3]);
    }

    #[test]
    fn test_reconstruct_keeps_stored_total() {
        let lines = vec![OrderLine::new(ProductId::new(), 1, Money::from_cents(500)).unwrap()];
        let stored_total = Money::from_cents(450);
        let order = Order::reconstruct(
            OrderId::new(),
            UserId::new(),
            Utc::now(),
            delivery(),
            OrderStatus::Created,
            stored_total,
            lines,
        );
        assert_eq!(order.total(), stored_total);
    }

    #[test]
    fn test_cancel_created_order() {
        let mut order = placed_order();
        assert!(order.cancel().is_ok());
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut order = placed_order();
        order.cancel().unwrap();
        assert_eq!(
            order.cancel().unwrap_err(),
            DomainError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled,
            }
        );
    }

    #[test]
    fn test_cancel_delivered_order_fails() {
        let mut order = placed_order();
        order.mark_delivered().unwrap();
        let result = order.cancel();
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { from: OrderStatus::Delivered, .. })
        ));
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_deliver_cancelled_order_fails() {
        let mut order = placed_order();
        order.cancel().unwrap();
        assert!(order.mark_delivered().is_err());
    }

    #[test]
    fn test_place_order_total_out_of_range_fails() {
        let price = Money::new(Decimal::new(600_000_000_000, 2)).unwrap();
        let lines = vec![
            CartLine::new(ProductId::new(), 1, price).unwrap(),
            CartLine::new(ProductId::new(), 1, price).unwrap(),
        ];

        let result = Order::place(OrderId::new(), UserId::new(), &lines, delivery(), Utc::now());

        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn test_order_line_invalid_quantity() {
        let result = OrderLine::new(ProductId::new(), 0, Money::from_cents(100));
        assert_eq!(result.unwrap_err(), DomainError::InvalidQuantity);
    }

    #[test]
    fn test_is_owned_by() {
        let order = placed_order();
        assert!(order.is_owned_by(order.user_id()));
        assert!(!order.is_owned_by(UserId::new()));
    }
}
