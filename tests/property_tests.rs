use proptest::prelude::*;
use storefront_checkout::adapter::driven::InMemoryStore;
use storefront_checkout::application::service::{
    CartApplicationService, CatalogApplicationService, OrderApplicationService,
};
use storefront_checkout::domain::error::DomainError;
use storefront_checkout::domain::model::{
    snapshot_lines, Cart, CartId, CartLine, DeliveryDetails, Money, Order, OrderId, Product,
    ProductId, UserId,
};

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

// Money のプロパティベーステスト
proptest! {
    /// Money の加算は交換法則を満たす (a + b = b + a)
    #[test]
    fn test_money_addition_is_commutative(
        cents1 in 0u32..1_000_000,
        cents2 in 0u32..1_000_000,
    ) {
        let money1 = Money::from_cents(cents1);
        let money2 = Money::from_cents(cents2);

        prop_assert_eq!(money1.add(&money2).unwrap(), money2.add(&money1).unwrap());
    }

    /// Money の乗算は分配法則を満たす (a * (b + c) = a * b + a * c)
    #[test]
    fn test_money_multiplication_distributive(
        cents in 1u32..100_000,
        factor1 in 1u32..100,
        factor2 in 1u32..100,
    ) {
        let money = Money::from_cents(cents);

        let left_side = money.multiply(factor1 + factor2).unwrap();
        let right_side = money
            .multiply(factor1)
            .unwrap()
            .add(&money.multiply(factor2).unwrap())
            .unwrap();

        prop_assert_eq!(left_side, right_side);
    }

    /// 演算結果は上限未満なら必ず成功し、上限以上なら必ずエラーになる（パニックしない）
    #[test]
    fn test_money_multiply_is_total(cents in any::<u32>(), factor in any::<u32>()) {
        let exact = u128::from(cents) * u128::from(factor);
        let result = Money::from_cents(cents).multiply(factor);

        if exact < 1_000_000_000_000 {
            let cents = i64::try_from(exact).unwrap();
            prop_assert_eq!(result.unwrap().amount(), Decimal::new(cents, 2));
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// 表示は常に小数点以下2桁
    #[test]
    fn test_money_display_has_two_decimals(cents in any::<u32>()) {
        let text = Money::from_cents(cents).to_string();
        let decimals = text.split('.').nth(1).map(str::len);
        prop_assert_eq!(decimals, Some(2));
    }
}

// Cart のプロパティベーステスト
proptest! {
    /// 同じ商品を何度追加しても明細は1つで、数量は合計になる
    #[test]
    fn test_repeated_adds_merge_into_one_line(
        quantities in prop::collection::vec(1u32..10, 1..20),
    ) {
        let total: u32 = quantities.iter().sum();
        let product = Product::new(ProductId::new(), "Taza".to_string(), Money::from_cents(1_000), total);
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());

        for quantity in &quantities {
            cart.add_product(&product, *quantity, Utc::now()).unwrap();
        }

        prop_assert_eq!(cart.lines().len(), 1);
        prop_assert_eq!(cart.item_count(), total);
    }

    /// 追加が受け付けられた後の明細数量は在庫を超えない
    /// 拒否された追加はカートを変更しない
    #[test]
    fn test_cart_line_never_exceeds_stock(
        stock in 0u32..50,
        quantities in prop::collection::vec(1u32..20, 1..15),
    ) {
        let product = Product::new(ProductId::new(), "Taza".to_string(), Money::from_cents(1_000), stock);
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());

        for quantity in quantities {
            let before = cart.item_count();
            let result = cart
                .add_product(&product, quantity, Utc::now())
                .map(|line| line.quantity());
            match result {
                Ok(line_quantity) => prop_assert!(line_quantity <= stock),
                Err(DomainError::InsufficientStock { available, .. }) => {
                    prop_assert_eq!(available, stock);
                    prop_assert_eq!(cart.item_count(), before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }

    /// カートの合計は明細の小計の総和と一致する
    #[test]
    fn test_cart_total_is_sum_of_subtotals(
        lines in prop::collection::vec((1u32..100_000, 1u32..20), 1..10),
    ) {
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());
        let mut expected = Money::zero();

        for (cents, quantity) in lines {
            let product = Product::new(ProductId::new(), "Artículo".to_string(), Money::from_cents(cents), quantity);
            cart.add_product(&product, quantity, Utc::now()).unwrap();
            expected = expected.add(&Money::from_cents(cents).multiply(quantity).unwrap()).unwrap();
        }

        prop_assert_eq!(cart.total().unwrap(), expected);
    }
}

// Order のプロパティベーステスト
proptest! {
    /// 注文の合計はカートの合計と一致し、明細はカート明細の写しになる
    #[test]
    fn test_order_snapshot_matches_cart(
        lines in prop::collection::vec((1u32..100_000, 1u32..20), 1..10),
    ) {
        let cart_lines: Vec<CartLine> = lines
            .iter()
            .map(|(cents, quantity)| CartLine::new(ProductId::new(), *quantity, Money::from_cents(*cents)).unwrap())
            .collect();
        let mut cart = Cart::new(CartId::new(), UserId::new(), Utc::now());
        for line in &cart_lines {
            let product = Product::new(line.product_id(), "Artículo".to_string(), line.unit_price(), line.quantity());
            cart.add_product(&product, line.quantity(), Utc::now()).unwrap();
        }
        let delivery = DeliveryDetails::new("Calle Mayor 1".to_string(), "600123456".to_string()).unwrap();

        let order = Order::place(OrderId::new(), cart.user_id(), cart.lines(), delivery, Utc::now()).unwrap();

        prop_assert_eq!(order.total(), cart.total().unwrap());
        let expected = snapshot_lines(cart.lines());
        prop_assert_eq!(order.lines(), expected.as_slice());
    }
}

#[derive(Debug, Clone)]
enum Operation {
    Add { buyer: usize, quantity: u32 },
    Checkout { buyer: usize },
    CancelLatest { buyer: usize },
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (0usize..3, 1u32..5).prop_map(|(buyer, quantity)| Operation::Add { buyer, quantity }),
        (0usize..3).prop_map(|buyer| Operation::Checkout { buyer }),
        (0usize..3).prop_map(|buyer| Operation::CancelLatest { buyer }),
    ]
}

// 在庫台帳のプロパティベーステスト
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 任意の操作列の後で、在庫 = 初期在庫 - 有効な注文の数量合計 が成り立つ
    /// （在庫は負にならず、キャンセル分だけ正確に戻る）
    #[test]
    fn test_stock_ledger_is_conserved(
        initial_stock in 0u32..15,
        operations in prop::collection::vec(operation_strategy(), 1..25),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = Arc::new(InMemoryStore::new());
            let catalog = CatalogApplicationService::new(store.clone());
            let carts = CartApplicationService::new(store.clone());
            let orders = OrderApplicationService::new(store.clone());

            let product = catalog
                .register_product("Taza".to_string(), Money::from_cents(1_000), initial_stock)
                .await
                .unwrap();
            let buyers: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();
            let mut open_orders: Vec<Vec<Order>> = vec![Vec::new(); 3];

            for operation in operations {
                match operation {
                    Operation::Add { buyer, quantity } => {
                        let _ = carts.add_product(buyers[buyer], product.id(), quantity).await;
                    }
                    Operation::Checkout { buyer } => {
                        if let Ok(order) = orders
                            .create_from_cart(buyers[buyer], "Calle Mayor 1".to_string(), "600123456".to_string())
                            .await
                        {
                            open_orders[buyer].push(order);
                        }
                    }
                    Operation::CancelLatest { buyer } => {
                        if let Some(order) = open_orders[buyer].pop() {
                            orders.cancel(order.id(), buyers[buyer]).await.unwrap();
                        }
                    }
                }

                let committed: u32 = open_orders
                    .iter()
                    .flatten()
                    .flat_map(|order| order.lines())
                    .map(|line| line.quantity())
                    .sum();
                let stock = store.product(product.id()).await.unwrap().stock();
                prop_assert!(committed <= initial_stock);
                prop_assert_eq!(stock, initial_stock - committed);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
