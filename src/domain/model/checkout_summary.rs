use crate::domain::error::DomainError;
use crate::domain::model::{Cart, Money};

/// 送料無料になる小計の下限（この値を含む）
pub const FREE_SHIPPING_THRESHOLD_CENTS: u32 = 5_000;
/// 下限未満の注文にかかる一律送料
pub const FLAT_SHIPPING_FEE_CENTS: u32 = 599;

/// 注文確定前の金額プレビュー
/// カートが保持する単価から計算し、在庫や注文には一切触れない
///
/// 注文の合計金額は明細の総和で固定されるため、ここでの送料は表示専用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    subtotal: Money,
    shipping: Money,
    total: Money,
    item_count: u32,
    line_count: usize,
}

impl CheckoutSummary {
    /// カートからプレビューを作成
    /// 空のカートは`EmptyCart`
    pub fn for_cart(cart: &Cart) -> Result<Self, DomainError> {
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let subtotal = cart.total()?;
        let shipping = shipping_for(subtotal);
        Ok(Self {
            subtotal,
            shipping,
            total: subtotal.add(&shipping)?,
            item_count: cart.item_count(),
            line_count: cart.lines().len(),
        })
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn shipping(&self) -> Money {
        self.shipping
    }

    /// 小計 + 送料
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn has_free_shipping(&self) -> bool {
        self.shipping == Money::zero()
    }
}

fn shipping_for(subtotal: Money) -> Money {
    if subtotal >= Money::from_cents(FREE_SHIPPING_THRESHOLD_CENTS) {
        Money::zero()
    } else {
        Money::from_cents(FLAT_SHIPPING_FEE_CENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CartId, Product, ProductId, UserId};
    use chrono::Utc;

    fn cart_with(lines: &[(u32, u32)]) -> Cart {
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());
        for (price_cents, quantity) in lines {
            let product = Product::new(
                ProductId::new(),
                "Funda".to_string(),
                Money::from_cents(*price_cents),
                *quantity,
            );
            cart.add_product(&product, *quantity, Utc::now()).unwrap();
        }
        cart
    }

    #[test]
    fn test_small_order_pays_flat_shipping() {
        let summary = CheckoutSummary::for_cart(&cart_with(&[(1_250, 2), (999, 1)])).unwrap();

        assert_eq!(summary.subtotal(), Money::from_cents(3_499));
        assert_eq!(summary.shipping(), Money::from_cents(599));
        assert_eq!(summary.total(), Money::from_cents(4_098));
        assert_eq!(summary.item_count(), 3);
        assert_eq!(summary.line_count(), 2);
        assert!(!summary.has_free_shipping());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at_threshold = CheckoutSummary::for_cart(&cart_with(&[(2_500, 2)])).unwrap();
        assert!(at_threshold.has_free_shipping());
        assert_eq!(at_threshold.total(), Money::from_cents(5_000));

        let just_below = CheckoutSummary::for_cart(&cart_with(&[(4_999, 1)])).unwrap();
        assert_eq!(just_below.total(), Money::from_cents(5_598));
    }

    #[test]
    fn test_empty_cart_has_no_summary() {
        let result = CheckoutSummary::for_cart(&cart_with(&[]));
        assert_eq!(result.unwrap_err(), DomainError::EmptyCart);
    }
}
