// 出力ポート
// ドメイン層が外部に依存する機能をトレイトとして定義
// アダプター層でこれらのトレイトを実装する

use crate::domain::model::{
    Cart, CartId, CartLine, Order, OrderId, OrderLine, OrderStatus, Product, ProductId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// リポジトリエラー型
/// リポジトリ操作で発生するエラーを表現する
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    /// データベース接続に失敗
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// 操作に失敗
    #[error("Operation failed: {0}")]
    OperationFailed(String),
    /// データの取得に失敗
    #[error("Fetch failed: {0}")]
    FetchFailed(String),
}

/// 在庫調整の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// 調整成功（調整後の在庫数）
    Applied { available: u32 },
    /// 在庫不足のため調整しなかった（現在の在庫数）
    Insufficient { available: u32 },
    /// 商品が存在しない
    ProductMissing,
}

/// トランザクション境界を提供するストア
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// 新しいトランザクション（作業単位）を開始する
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}

/// 作業単位（1つのデータベーストランザクション）
/// `commit`せずに破棄した場合、すべての変更はロールバックされる
#[async_trait]
pub trait UnitOfWork: Send {
    fn catalog(&mut self) -> &mut dyn CatalogRepository;

    fn carts(&mut self) -> &mut dyn CartRepository;

    fn orders(&mut self) -> &mut dyn OrderRepository;

    /// すべての変更を確定する
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// 商品カタログリポジトリトレイト
/// 在庫台帳（利用可能在庫数）の参照と更新を含む
#[async_trait]
pub trait CatalogRepository: Send {
    /// 商品IDで商品を検索する（販売停止中の商品も返す）
    async fn find_by_id(&mut self, product_id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// 商品を保存する（カタログ管理側の境界）
    /// 既存商品の場合、在庫数は更新しない
    async fn save(&mut self, product: &Product) -> Result<(), RepositoryError>;

    /// 在庫数を`delta`だけ調整する
    /// 減算は「在庫 >= 減算数」の条件付きで原子的に行い、在庫を負にしない
    ///
    /// # Returns
    /// * `Ok(StockAdjustment::Applied)` - 調整成功
    /// * `Ok(StockAdjustment::Insufficient)` - 在庫不足（何も変更しない）
    /// * `Ok(StockAdjustment::ProductMissing)` - 商品が存在しない
    /// * `Err(RepositoryError)` - 操作失敗
    async fn adjust_stock(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, RepositoryError>;
}

/// カートリポジトリトレイト
/// カート集約の永続化を抽象化する
#[async_trait]
pub trait CartRepository: Send {
    /// ユーザーのカートを取得し、なければ作成する
    /// 取得したカートはトランザクション終了まで排他ロックされる
    async fn lock_or_create(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<Cart, RepositoryError>;

    /// ユーザーのカートを排他ロックして取得する
    async fn lock_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// ユーザーのカートを取得する（読み取り専用）
    async fn find_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// カートと商品の組で明細を検索する
    async fn find_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// 明細を保存する（同じ商品の明細があれば置き換える）
    async fn save_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<(), RepositoryError>;

    /// 明細を削除する（存在しなくてもエラーにしない）
    async fn delete_line(&mut self, cart_id: CartId, product_id: ProductId) -> Result<(), RepositoryError>;

    /// カートのすべての明細を削除する
    async fn clear(&mut self, cart_id: CartId) -> Result<(), RepositoryError>;

    /// カートの最終更新日時を更新する
    async fn touch(&mut self, cart_id: CartId, now: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// カートを明細ごと削除する
    async fn delete(&mut self, cart_id: CartId) -> Result<(), RepositoryError>;
}

/// 注文リポジトリトレイト
/// 注文集約の永続化を抽象化する
#[async_trait]
pub trait OrderRepository: Send {
    /// 新しい注文を明細とともに保存する
    async fn insert(&mut self, order: &Order) -> Result<(), RepositoryError>;

    /// 注文IDで注文を検索する
    async fn find_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 注文を排他ロックして取得する
    async fn lock_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// 注文の明細を取得する
    async fn find_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    /// ユーザーの注文を作成日時の降順で取得する
    async fn find_by_user(&mut self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// 指定されたステータスの注文を作成日時の降順で取得する
    async fn find_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;

    /// 注文ステータスを更新する
    async fn update_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<(), RepositoryError>;

    /// 新しい一意の注文IDを生成する
    fn next_identity(&self) -> OrderId {
        OrderId::new()
    }
}
