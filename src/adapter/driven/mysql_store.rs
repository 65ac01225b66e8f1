use crate::adapter::database_error::DatabaseError;
use crate::domain::port::{
    CartRepository, CatalogRepository, OrderRepository, RepositoryError, TransactionalStore,
    UnitOfWork,
};
use async_trait::async_trait;
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, Pool, Row, Transaction};

/// MySQLストア
/// 作業単位ごとに1つのMySQLトランザクションを開始する
#[derive(Clone)]
pub struct MySqlStore {
    pool: Pool<MySql>,
}

impl MySqlStore {
    /// 新しいMySQLストアを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalStore for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;
        Ok(Box::new(MySqlUnitOfWork { tx }))
    }
}

/// MySQLの作業単位
/// リポジトリ操作はすべて同じトランザクション上で実行される
/// コミットせずに破棄するとsqlxがロールバックする
pub struct MySqlUnitOfWork {
    pub(super) tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
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
        self.tx
            .commit()
            .await
            .map_err(|e| {
                DatabaseError::QueryError(format!("トランザクションのコミットに失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)
    }
}

/// クエリ失敗をリポジトリエラーに変換する
pub(super) fn query_failed(context: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| DatabaseError::QueryError(format!("{}に失敗しました: {}", context, e)).into()
}

/// 保存値の変換失敗をリポジトリエラーに変換する
pub(super) fn decode_failed<E: std::fmt::Display>(
    context: &'static str,
) -> impl FnOnce(E) -> RepositoryError {
    move |e| DatabaseError::DecodeError(format!("{}の解析に失敗しました: {}", context, e)).into()
}

/// 列の値を取得する
pub(super) fn column<'r, T>(row: &'r MySqlRow, name: &'static str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get(name).map_err(decode_failed(name))
}
