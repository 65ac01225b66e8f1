use super::mysql_store::{column, decode_failed, query_failed, MySqlUnitOfWork};
use crate::domain::model::{Money, Product, ProductId};
use crate::domain::port::{CatalogRepository, RepositoryError, StockAdjustment};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;

fn product_from_row(row: &MySqlRow) -> Result<Product, RepositoryError> {
    let id = ProductId::from_string(&column::<String>(row, "id")?).map_err(decode_failed("商品ID"))?;
    let price = Money::new(column::<Decimal>(row, "price")?).map_err(decode_failed("価格"))?;
    Ok(Product::reconstruct(
        id,
        column(row, "name")?,
        price,
        column(row, "stock")?,
        column(row, "active")?,
    ))
}

impl MySqlUnitOfWork {
    /// 現在の在庫数をロックして読み取る
    async fn current_stock(&mut self, product_id: ProductId) -> Result<Option<u32>, RepositoryError> {
        let row = sqlx::query("SELECT stock FROM products WHERE id = ? FOR UPDATE")
            .bind(product_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_failed("在庫の取得"))?;

        row.map(|row| column::<u32>(&row, "stock")).transpose()
    }
}

#[async_trait]
impl CatalogRepository for MySqlUnitOfWork {
    async fn find_by_id(&mut self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, price, stock, active FROM products WHERE id = ?")
            .bind(product_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_failed("商品の取得"))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn save(&mut self, product: &Product) -> Result<(), RepositoryError> {
        // 既存商品の在庫はadjust_stockでのみ変化させる
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock, active)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                price = VALUES(price),
                active = VALUES(active)
            "#,
        )
        .bind(product.id().to_string())
        .bind(product.name())
        .bind(product.price().amount())
        .bind(product.stock())
        .bind(product.is_active())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("商品の保存"))?;

        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<StockAdjustment, RepositoryError> {
        if delta == 0 {
            return Ok(match self.current_stock(product_id).await? {
                Some(available) => StockAdjustment::Applied { available },
                None => StockAdjustment::ProductMissing,
            });
        }

        // 減算は「在庫 >= 数量」の条件付きUPDATEで行い、チェックと書き込みを分けない
        let quantity = delta.unsigned_abs();
        let query = if delta < 0 {
            sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
                .bind(quantity)
                .bind(product_id.to_string())
                .bind(quantity)
        } else {
            sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ?")
                .bind(quantity)
                .bind(product_id.to_string())
        };
        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("在庫の更新"))?;

        let applied = result.rows_affected() == 1;
        Ok(match (applied, self.current_stock(product_id).await?) {
            (_, None) => StockAdjustment::ProductMissing,
            (true, Some(available)) => StockAdjustment::Applied { available },
            (false, Some(available)) => StockAdjustment::Insufficient { available },
        })
    }
}
