use crate::application::ApplicationError;
use crate::domain::model::{Order, OrderId, OrderStatus, UserId};
use crate::domain::port::TransactionalStore;
use std::sync::Arc;

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    store: Arc<dyn TransactionalStore>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `store` - トランザクションストア
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// 注文IDで注文を取得
    ///
    /// # Returns
    /// * `Ok(Some(Order))` - 注文が見つかった
    /// * `Ok(None)` - 注文が見つからなかった
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let order = uow.orders().find_by_id(order_id).await?;
        Ok(order)
    }

    /// ユーザーの注文履歴を取得
    /// 作成日時の降順で並べて返す
    pub async fn find_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let orders = uow.orders().find_by_user(user_id).await?;
        Ok(orders)
    }

    /// 指定されたステータスの注文を取得
    /// 作成日時の降順で並べて返す
    ///
    /// # Arguments
    /// * `status` - フィルタリングする注文ステータス
    pub async fn find_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let orders = uow.orders().find_by_status(status).await?;
        Ok(orders)
    }
}
