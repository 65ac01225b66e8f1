use crate::application::{ApplicationError, Resource};
use crate::domain::error::DomainError;
use crate::domain::model::{Cart, CartLine, CheckoutSummary, Money, ProductId, UserId};
use crate::domain::port::TransactionalStore;
use chrono::Utc;
use std::sync::Arc;

/// カートアプリケーションサービス
/// すべての操作は単一ユーザーのカートに対して1トランザクションで実行される
/// 在庫はチェックするのみで引き当てない（引当は注文作成時）
pub struct CartApplicationService {
    store: Arc<dyn TransactionalStore>,
}

impl CartApplicationService {
    /// 新しいカートアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `store` - トランザクションストア
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// 商品をカートに追加
    /// カートが存在しなければ作成し、同じ商品の明細があれば数量を加算する
    ///
    /// # Arguments
    /// * `user_id` - ユーザーID
    /// * `product_id` - 商品ID
    /// * `quantity` - 追加する数量（1以上）
    ///
    /// # Returns
    /// * `Ok(Cart)` - 更新後のカート
    /// * `Err(ApplicationError)` - 商品が存在しない、販売停止中、加算後の数量が在庫を超える など
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let now = Utc::now();

        let product = uow
            .catalog()
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Product(product_id)))?;

        let mut cart = uow.carts().lock_or_create(user_id, now).await?;
        let line = cart
            .add_product(&product, quantity, now)
            .inspect_err(|err| tracing::warn!(error = %err, "add to cart rejected"))?
            .clone();

        uow.carts().save_line(cart.id(), &line).await?;
        uow.carts().touch(cart.id(), now).await?;
        uow.commit().await?;

        tracing::info!(cart_id = %cart.id(), line_quantity = line.quantity(), "product added to cart");
        Ok(cart)
    }

    /// 明細の数量を絶対値で更新
    /// 0以下の数量は明細の削除として扱う（明細が存在しなくてもエラーにしない）
    ///
    /// # Returns
    /// * `Ok(Cart)` - 更新後のカート
    /// * `Err(ApplicationError)` - カートが存在しない、商品が存在しない、在庫不足 など
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let now = Utc::now();

        let mut cart = uow
            .carts()
            .lock_by_user(user_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Cart(user_id)))?;

        if quantity <= 0 {
            if cart.remove_product(product_id, now) {
                uow.carts().delete_line(cart.id(), product_id).await?;
                uow.carts().touch(cart.id(), now).await?;
                uow.commit().await?;
                tracing::info!(cart_id = %cart.id(), "cart line removed by zero quantity");
            }
            return Ok(cart);
        }

        let quantity = u32::try_from(quantity).map_err(|_| DomainError::InvalidQuantity)?;
        let product = uow
            .catalog()
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Product(product_id)))?;

        let line = cart
            .set_quantity(&product, quantity, now)
            .inspect_err(|err| tracing::warn!(error = %err, "quantity update rejected"))?
            .clone();

        uow.carts().save_line(cart.id(), &line).await?;
        uow.carts().touch(cart.id(), now).await?;
        uow.commit().await?;
        Ok(cart)
    }

    /// 商品の明細を削除（存在しなくてもエラーにしない）
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ApplicationError> {
        let mut uow = self.store.begin().await?;
        let now = Utc::now();

        let Some(mut cart) = uow.carts().lock_by_user(user_id).await? else {
            return Ok(());
        };
        if cart.remove_product(product_id, now) {
            uow.carts().delete_line(cart.id(), product_id).await?;
            uow.carts().touch(cart.id(), now).await?;
            uow.commit().await?;
        }
        Ok(())
    }

    /// カートのすべての明細を削除（カート自体は再利用のため残す）
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let mut uow = self.store.begin().await?;
        let now = Utc::now();

        let Some(mut cart) = uow.carts().lock_by_user(user_id).await? else {
            return Ok(());
        };
        cart.clear(now);
        uow.carts().clear(cart.id()).await?;
        uow.carts().touch(cart.id(), now).await?;
        uow.commit().await?;
        Ok(())
    }

    /// カートを明細ごと削除
    #[tracing::instrument(skip(self))]
    pub async fn delete_cart(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let mut uow = self.store.begin().await?;
        if let Some(cart) = uow.carts().lock_by_user(user_id).await? {
            uow.carts().delete(cart.id()).await?;
            uow.commit().await?;
        }
        Ok(())
    }

    /// ユーザーのカートを取得
    pub async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, ApplicationError> {
        self.snapshot(user_id).await
    }

    /// カート明細の一覧を取得（カートがなければ空）
    pub async fn get_items(&self, user_id: UserId) -> Result<Vec<CartLine>, ApplicationError> {
        Ok(self
            .snapshot(user_id)
            .await?
            .map(|cart| cart.lines().to_vec())
            .unwrap_or_default())
    }

    /// カート内の商品点数（数量の総和）を取得
    pub async fn count_items(&self, user_id: UserId) -> Result<u32, ApplicationError> {
        Ok(self
            .snapshot(user_id)
            .await?
            .map_or(0, |cart| cart.item_count()))
    }

    /// カートの合計金額を取得
    pub async fn get_total(&self, user_id: UserId) -> Result<Money, ApplicationError> {
        match self.snapshot(user_id).await? {
            Some(cart) => Ok(cart.total()?),
            None => Ok(Money::zero()),
        }
    }

    /// 注文確定前の金額プレビュー（小計・送料・合計）
    /// 読み取り専用で、在庫の引当やカートの変更は行わない
    ///
    /// # Returns
    /// * `Ok(CheckoutSummary)` - プレビュー
    /// * `Err(ApplicationError)` - カートが存在しないか空の場合は`EmptyCart`
    #[tracing::instrument(skip(self))]
    pub async fn checkout_summary(&self, user_id: UserId) -> Result<CheckoutSummary, ApplicationError> {
        let cart = self.snapshot(user_id).await?.ok_or(DomainError::EmptyCart)?;
        Ok(CheckoutSummary::for_cart(&cart)?)
    }

    /// カート内の特定商品の明細を取得
    pub async fn get_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let Some(cart) = uow.carts().find_by_user(user_id).await? else {
            return Ok(None);
        };
        let line = uow.carts().find_line(cart.id(), product_id).await?;
        Ok(line)
    }

    /// 読み取り専用のスナップショット（トランザクションはコミットせず破棄する）
    async fn snapshot(&self, user_id: UserId) -> Result<Option<Cart>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let cart = uow.carts().find_by_user(user_id).await?;
        Ok(cart)
    }
}
