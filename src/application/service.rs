use crate::application::{ApplicationError, Resource};
use crate::domain::error::DomainError;
use crate::domain::model::{Money, Product, ProductId};
use crate::domain::port::TransactionalStore;
use std::sync::Arc;

mod cart_service;
mod order_query_service;
mod order_service;

pub use cart_service::CartApplicationService;
pub use order_query_service::OrderQueryService;
pub use order_service::OrderApplicationService;

/// カタログアプリケーションサービス
/// 商品カタログ管理との境界（登録・価格変更・販売状態）のみを扱う
pub struct CatalogApplicationService {
    store: Arc<dyn TransactionalStore>,
}

impl CatalogApplicationService {
    /// 新しいカタログアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `store` - トランザクションストア
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// 新しい商品を登録
    ///
    /// # Arguments
    /// * `name` - 商品名
    /// * `price` - カタログ価格
    /// * `stock` - 初期在庫数
    ///
    /// # Returns
    /// * `Ok(Product)` - 登録された商品
    /// * `Err(ApplicationError)` - 登録失敗
    #[tracing::instrument(skip(self))]
    pub async fn register_product(
        &self,
        name: String,
        price: Money,
        stock: u32,
    ) -> Result<Product, ApplicationError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidValue("商品名は空にできません".to_string()).into());
        }

        let product = Product::new(ProductId::new(), name.trim().to_string(), price, stock);
        let mut uow = self.store.begin().await?;
        uow.catalog().save(&product).await?;
        uow.commit().await?;

        tracing::info!(product_id = %product.id(), stock, "product registered");
        Ok(product)
    }

    /// カタログ価格を変更
    /// 作成済みのカート明細・注文明細の単価は変わらない
    #[tracing::instrument(skip(self))]
    pub async fn change_price(
        &self,
        product_id: ProductId,
        price: Money,
    ) -> Result<Product, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let mut product = uow
            .catalog()
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Product(product_id)))?;
        product.change_price(price);
        uow.catalog().save(&product).await?;
        uow.commit().await?;
        Ok(product)
    }

    /// 商品の販売状態を変更
    #[tracing::instrument(skip(self))]
    pub async fn set_active(
        &self,
        product_id: ProductId,
        active: bool,
    ) -> Result<Product, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let mut product = uow
            .catalog()
            .find_by_id(product_id)
            .await?
            .ok_or(ApplicationError::NotFound(Resource::Product(product_id)))?;
        product.set_active(active);
        uow.catalog().save(&product).await?;
        uow.commit().await?;
        Ok(product)
    }

    /// 商品IDで商品を取得
    ///
    /// # Returns
    /// * `Ok(Some(Product))` - 商品が見つかった
    /// * `Ok(None)` - 商品が見つからなかった
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>, ApplicationError> {
        let mut uow = self.store.begin().await?;
        let product = uow.catalog().find_by_id(product_id).await?;
        Ok(product)
    }
}
