use crate::domain::model::{
    Cart, CartId, CartLine, Order, OrderId, OrderLine, OrderStatus, Product, ProductId, UserId,
};
use crate::domain::port::{
    CartRepository, CatalogRepository, OrderRepository, RepositoryError, StockAdjustment,
    TransactionalStore, UnitOfWork,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// カートの保存形式（cartsテーブル + cart_linesテーブル相当）
#[derive(Debug, Clone)]
struct CartRecord {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    lines: Vec<CartLine>,
}

impl CartRecord {
    fn to_cart(&self) -> Cart {
        Cart::reconstruct(self.id, self.user_id, self.created_at, self.updated_at, self.lines.clone())
    }
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, CartRecord>,
    orders: HashMap<OrderId, Order>,
}

impl StoreState {
    fn cart_mut(&mut self, cart_id: CartId) -> Result<&mut CartRecord, RepositoryError> {
        self.carts
            .values_mut()
            .find(|record| record.id == cart_id)
            .ok_or_else(|| RepositoryError::OperationFailed(format!("カートが存在しません: {}", cart_id)))
    }

    fn orders_newest_first<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Order> = self.orders.values().filter(|o| predicate(o)).cloned().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }
}

/// インメモリストア
/// トランザクションは1つずつ直列に実行され（直列化可能）、
/// 開始時に状態を複製し、コミット時にのみ書き戻す
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在コミットされている商品を取得（テスト・検証用）
    pub async fn product(&self, product_id: ProductId) -> Option<Product> {
        self.state.lock().await.products.get(&product_id).cloned()
    }

    /// コミット済みの注文数
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, working }))
    }
}

/// インメモリの作業単位
/// 破棄されると作業用の状態ごと捨てられる（ロールバック）
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn catalog(&mut self) -> &mut dyn CatalogRepository {
        self
    }

    fn carts(&mut self) -> &mut dyn CartRepository {
        self
    }

    fn orders(&mut self) -> &mut dyn OrderRepository {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryUnitOfWork {
    async fn find_by_id(&mut self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.working.products.get(&product_id).cloned())
    }

    async fn save(&mut self, product: &Product) -> Result<(), RepositoryError> {
        // 既存商品の在庫はadjust_stockでのみ変化させる
        let stock = self
            .working
            .products
            .get(&product.id())
            .map_or(product.stock(), Product::stock);
        let stored = Product::reconstruct(
            product.id(),
            product.name().to_string(),
            product.price(),
            stock,
            product.is_active(),
        );
        self.working.products.insert(product.id(), stored);
        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, RepositoryError> {
        let Some(product) = self.working.products.get(&product_id) else {
            return Ok(StockAdjustment::ProductMissing);
        };

        let current = product.stock();
        let next = i64::from(current) + delta;
        if next < 0 {
            return Ok(StockAdjustment::Insufficient { available: current });
        }
        let next = u32::try_from(next)
            .map_err(|_| RepositoryError::OperationFailed(format!("在庫数が上限を超えました: {}", next)))?;

        let updated = Product::reconstruct(
            product.id(),
            product.name().to_string(),
            product.price(),
            next,
            product.is_active(),
        );
        self.working.products.insert(product_id, updated);
        Ok(StockAdjustment::Applied { available: next })
    }
}

#[async_trait]
impl CartRepository for InMemoryUnitOfWork {
    async fn lock_or_create(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<Cart, RepositoryError> {
        let record = self.working.carts.entry(user_id).or_insert_with(|| CartRecord {
            id: CartId::new(),
            user_id,
            created_at: now,
            updated_at: now,
            lines: Vec::new(),
        });
        Ok(record.to_cart())
    }

    async fn lock_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::find_by_user(self, user_id).await
    }

    async fn find_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.working.carts.get(&user_id).map(CartRecord::to_cart))
    }

    async fn find_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .find(|record| record.id == cart_id)
            .and_then(|record| record.lines.iter().find(|l| l.product_id() == product_id))
            .cloned())
    }

    async fn save_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<(), RepositoryError> {
        let record = self.working.cart_mut(cart_id)?;
        match record.lines.iter_mut().find(|l| l.product_id() == line.product_id()) {
            Some(existing) => *existing = line.clone(),
            None => record.lines.push(line.clone()),
        }
        Ok(())
    }

    async fn delete_line(&mut self, cart_id: CartId, product_id: ProductId) -> Result<(), RepositoryError> {
        let record = self.working.cart_mut(cart_id)?;
        record.lines.retain(|l| l.product_id() != product_id);
        Ok(())
    }

    async fn clear(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        self.working.cart_mut(cart_id)?.lines.clear();
        Ok(())
    }

    async fn touch(&mut self, cart_id: CartId, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.working.cart_mut(cart_id)?.updated_at = now;
        Ok(())
    }

    async fn delete(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        self.working.carts.retain(|_, record| record.id != cart_id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryUnitOfWork {
    async fn insert(&mut self, order: &Order) -> Result<(), RepositoryError> {
        if self.working.orders.contains_key(&order.id()) {
            return Err(RepositoryError::OperationFailed(format!(
                "注文IDが重複しています: {}",
                order.id()
            )));
        }
        self.working.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.orders.get(&order_id).cloned())
    }

    async fn lock_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::find_by_id(self, order_id).await
    }

    async fn find_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        Ok(self
            .working
            .orders
            .get(&order_id)
            .map(|order| order.lines().to_vec())
            .unwrap_or_default())
    }

    async fn find_by_user(&mut self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.working.orders_newest_first(|order| order.user_id() == user_id))
    }

    async fn find_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.working.orders_newest_first(|order| order.status() == status))
    }

    async fn update_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let order = self
            .working
            .orders
            .get(&order_id)
            .ok_or_else(|| RepositoryError::OperationFailed(format!("注文が存在しません: {}", order_id)))?;
        let updated = Order::reconstruct(
            order.id(),
            order.user_id(),
            order.created_at(),
            order.delivery().clone(),
            status,
            order.total(),
            order.lines().to_vec(),
        );
        self.working.orders.insert(order_id, updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Money;

    fn product(stock: u32) -> Product {
        Product::new(ProductId::new(), "Webcam".to_string(), Money::from_cents(3_500), stock)
    }

    #[tokio::test]
    async fn test_commit_persists_changes() {
        let store = InMemoryStore::new();
        let webcam = product(5);

        let mut uow = store.begin().await.unwrap();
        uow.catalog().save(&webcam).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(store.product(webcam.id()).await, Some(webcam));
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = InMemoryStore::new();
        let webcam = product(5);

        {
            let mut uow = store.begin().await.unwrap();
            uow.catalog().save(&webcam).await.unwrap();
        }

        assert!(store.product(webcam.id()).await.is_none());
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let store = InMemoryStore::new();
        let webcam = product(2);
        let mut uow = store.begin().await.unwrap();
        uow.catalog().save(&webcam).await.unwrap();

        let first = uow.catalog().adjust_stock(webcam.id(), -2).await.unwrap();
        let second = uow.catalog().adjust_stock(webcam.id(), -1).await.unwrap();
        let missing = uow.catalog().adjust_stock(ProductId::new(), -1).await.unwrap();

        assert_eq!(first, StockAdjustment::Applied { available: 0 });
        assert_eq!(second, StockAdjustment::Insufficient { available: 0 });
        assert_eq!(missing, StockAdjustment::ProductMissing);
    }

    #[tokio::test]
    async fn test_lock_or_create_returns_same_cart() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut uow = store.begin().await.unwrap();

        let first = uow.carts().lock_or_create(user_id, Utc::now()).await.unwrap();
        let second = uow.carts().lock_or_create(user_id, Utc::now()).await.unwrap();

        assert_eq!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_find_lines_and_duplicate_insert() {
        let store = InMemoryStore::new();
        let lines = vec![
            CartLine::new(ProductId::new(), 2, Money::from_cents(1_000)).unwrap(),
            CartLine::new(ProductId::new(), 1, Money::from_cents(2_599)).unwrap(),
        ];
        let delivery = crate::domain::model::DeliveryDetails::new(
            "Calle Mayor 1".to_string(),
            "600123456".to_string(),
        )
        .unwrap();
        let order = Order::place(OrderId::new(), UserId::new(), &lines, delivery, Utc::now()).unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.orders().insert(&order).await.unwrap();
        assert!(uow.orders().insert(&order).await.is_err());

        let stored = uow.orders().find_lines(order.id()).await.unwrap();
        assert_eq!(stored, order.lines());
        assert!(uow.orders().find_lines(OrderId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_line_replaces_existing_line() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let cart = uow.carts().lock_or_create(UserId::new(), Utc::now()).await.unwrap();
        let product_id = ProductId::new();

        let line = CartLine::new(product_id, 1, Money::from_cents(100)).unwrap();
        uow.carts().save_line(cart.id(), &line).await.unwrap();
        let line = CartLine::new(product_id, 4, Money::from_cents(100)).unwrap();
        uow.carts().save_line(cart.id(), &line).await.unwrap();

        let stored = uow.carts().find_line(cart.id(), product_id).await.unwrap().unwrap();
        assert_eq!(stored.quantity(), 4);
        let cart = uow.carts().find_by_user(cart.user_id()).await.unwrap().unwrap();
        assert_eq!(cart.lines().len(), 1);
    }
}
