use crate::application::{ApplicationError, Resource};
use crate::domain::error::DomainError;
use crate::domain::model::{DeliveryDetails, Order, OrderId, UserId};
use crate::domain::port::TransactionalStore;
use crate::domain::service::StockLedger;
use chrono::Utc;
use std::sync::Arc;

/// 注文アプリケーションサービス
/// 注文の作成とステータス遷移を担当する
pub struct OrderApplicationService {
    store: Arc<dyn TransactionalStore>,
}

impl OrderApplicationService {
    /// 新しい注文アプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `store` - トランザクションストア
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// カートの内容から注文を作成
    ///
    /// 1つのトランザクション内で以下を行う:
    /// 1. カートを排他ロックして読み込む（明細がなければ`EmptyCart`）
    /// 2. 各明細の在庫を再検証する
    /// 3. 注文と注文明細を作成する（合計はカートの単価で計算）
    /// 4. 在庫を条件付きで減算する
    /// 5. カートを空にする
    ///
    /// いずれかが失敗した場合、注文・明細・在庫のどれも変更されない
    ///
    /// # Arguments
    /// * `user_id` - 購入者のユーザーID
    /// * `address` - 配達先住所
    /// * `contact_phone` - 連絡先電話番号
    ///
    /// # Returns
    /// * `Ok(Order)` - 作成された注文
    /// * `Err(ApplicationError)` - 作成失敗
    #[tracing::instrument(skip(self, address, contact_phone))]
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
        address: String,
        contact_phone: String,
    ) -> Result<Order, ApplicationError> {
        let delivery = DeliveryDetails::new(address, contact_phone)?;

        let mut uow = self.store.begin().await?;
        let now = Utc::now();

        let mut cart = match uow.carts().lock_by_user(user_id).await? {
            Some(cart) if !cart.is_empty() => cart,
            _ => {
                tracing::warn!("checkout attempted with an empty cart");
                return Err(DomainError::EmptyCart.into());
            }
        };

        // カートに追加した時点から在庫が変わっている可能性があるため再検証する
        for line in cart.lines() {
            let product = uow
                .catalog()
                .find_by_id(line.product_id())
                .await?
                .ok_or(ApplicationError::NotFound(Resource::Product(line.product_id())))?;
            product
                .ensure_available(line.quantity())
                .inspect_err(|err| tracing::warn!(error = %err, "stock re-validation failed"))?;
        }

        let order_id = uow.orders().next_identity();
        let order = Order::place(order_id, user_id, cart.lines(), delivery, now)?;

        StockLedger::withdraw(uow.catalog(), order.lines())
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "stock withdrawal failed"))?;
        uow.orders().insert(&order).await?;

        cart.clear(now);
        uow.carts().clear(cart.id()).await?;
        uow.carts().touch(cart.id(), now).await?;
        uow.commit().await?;

        tracing::info!(order_id = %order.id(), total = %order.total(), lines = order.lines().len(), "order created");
        Ok(order)
    }

    /// 注文をキャンセルし、在庫を戻す
    /// ステータス変更と在庫の戻しは同じトランザクションで行う
    ///
    /// # Arguments
    /// * `order_id` - 注文ID
    /// * `requester` - 操作を要求したユーザーID（注文の所有者である必要がある）
    ///
    /// # Returns
    /// * `Ok(Order)` - キャンセル後の注文
    /// * `Err(ApplicationError)` - 注文が存在しない、所有者でない、Created以外 など
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, requester: UserId) -> Result<Order, ApplicationError> {
        let mut uow = self.store.begin().await?;

        // 行ロックを取ってからステータスを確認するため、二重キャンセルで在庫が2回戻ることはない
        let mut order = uow
            .orders()
            .lock_by_id(order_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Order(order_id)))?;

        if !order.is_owned_by(requester) {
            tracing::warn!(owner = %order.user_id(), "cancel requested by non-owner");
            return Err(ApplicationError::AuthorizationFailure { requester, order_id });
        }

        order
            .cancel()
            .inspect_err(|err| tracing::warn!(error = %err, "cancel rejected"))?;
        uow.orders().update_status(order_id, order.status()).await?;
        StockLedger::restore(uow.catalog(), order.lines()).await?;
        uow.commit().await?;

        tracing::info!("order cancelled and stock restored");
        Ok(order)
    }

    /// 注文を配達完了にする（管理操作）
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, ApplicationError> {
        let mut uow = self.store.begin().await?;

        let mut order = uow
            .orders()
            .lock_by_id(order_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Order(order_id)))?;
        order.mark_delivered()?;
        uow.orders().update_status(order_id, order.status()).await?;
        uow.commit().await?;

        tracing::info!("order delivered");
        Ok(order)
    }
}
