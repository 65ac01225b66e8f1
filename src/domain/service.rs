// ドメインサービス
// 複数の集約にまたがるビジネスロジックを実装

use crate::domain::error::DomainError;
use crate::domain::model::{OrderLine, ProductId};
use crate::domain::port::{CatalogRepository, RepositoryError, StockAdjustment};

/// 在庫台帳サービスのエラー
#[derive(Debug, thiserror::Error)]
pub enum StockLedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("Product not found: {0}")]
    ProductMissing(ProductId),
}

/// 在庫台帳サービス
/// 注文作成時の在庫引当、キャンセル時の在庫戻しを担当
pub struct StockLedger;

impl StockLedger {
    /// 注文明細の全商品の在庫を減算する
    /// 商品IDの昇順で処理し、複数トランザクション間のロック順序を揃える
    ///
    /// # Returns
    /// * `Ok(())` - 減算成功
    /// * `Err(StockLedgerError)` - 最初に不足した商品の在庫不足など
    ///   （呼び出し側はトランザクションを破棄すること）
    pub async fn withdraw(
        catalog: &mut dyn CatalogRepository,
        lines: &[OrderLine],
    ) -> Result<(), StockLedgerError> {
        for line in Self::in_lock_order(lines) {
            let delta = -i64::from(line.quantity());
            match catalog.adjust_stock(line.product_id(), delta).await? {
                StockAdjustment::Applied { .. } => {}
                StockAdjustment::Insufficient { available } => {
                    return Err(DomainError::InsufficientStock {
                        product_id: line.product_id(),
                        available,
                    }
                    .into());
                }
                StockAdjustment::ProductMissing => {
                    return Err(StockLedgerError::ProductMissing(line.product_id()));
                }
            }
        }
        Ok(())
    }

    /// 注文明細の全商品の在庫を戻す（キャンセル時の補償）
    pub async fn restore(
        catalog: &mut dyn CatalogRepository,
        lines: &[OrderLine],
    ) -> Result<(), StockLedgerError> {
        for line in Self::in_lock_order(lines) {
            let delta = i64::from(line.quantity());
            if let StockAdjustment::ProductMissing =
                catalog.adjust_stock(line.product_id(), delta).await?
            {
                return Err(StockLedgerError::ProductMissing(line.product_id()));
            }
        }
        Ok(())
    }

    fn in_lock_order(lines: &[OrderLine]) -> Vec<&OrderLine> {
        let mut ordered: Vec<&OrderLine> = lines.iter().collect();
        ordered.sort_by_key(|line| line.product_id());
        ordered
    }
}
