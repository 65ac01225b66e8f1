use super::mysql_store::{column, decode_failed, query_failed, MySqlUnitOfWork};
use crate::domain::model::{Cart, CartId, CartLine, Money, ProductId, UserId};
use crate::domain::port::{CartRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;

const SELECT_CART: &str = "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?";
const SELECT_CART_FOR_UPDATE: &str =
    "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ? FOR UPDATE";
const SELECT_LINES: &str =
    "SELECT product_id, quantity, unit_price FROM cart_lines WHERE cart_id = ? ORDER BY line_no";
const SELECT_LINES_FOR_UPDATE: &str =
    "SELECT product_id, quantity, unit_price FROM cart_lines WHERE cart_id = ? ORDER BY line_no FOR UPDATE";
// 既存カートとの衝突は`user_id`の一意キーだけが握りつぶされ、型不一致や外部キー違反はエラーになる
const INSERT_CART_IF_ABSENT: &str = "INSERT INTO carts (id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?) \
     ON DUPLICATE KEY UPDATE id = id";

fn line_from_row(row: &MySqlRow) -> Result<CartLine, RepositoryError> {
    let product_id =
        ProductId::from_string(&column::<String>(row, "product_id")?).map_err(decode_failed("商品ID"))?;
    let unit_price = Money::new(column::<Decimal>(row, "unit_price")?).map_err(decode_failed("単価"))?;
    CartLine::new(product_id, column(row, "quantity")?, unit_price).map_err(decode_failed("カート明細"))
}

impl MySqlUnitOfWork {
    /// カートと明細を読み込む
    /// `locking`の場合はカート行と明細行を`FOR UPDATE`でロックし、最新のコミット済みの値を読む
    async fn load_cart(&mut self, user_id: UserId, locking: bool) -> Result<Option<Cart>, RepositoryError> {
        let (cart_sql, lines_sql) = if locking {
            (SELECT_CART_FOR_UPDATE, SELECT_LINES_FOR_UPDATE)
        } else {
            (SELECT_CART, SELECT_LINES)
        };

        let Some(row) = sqlx::query(cart_sql)
            .bind(user_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_failed("カートの取得"))?
        else {
            return Ok(None);
        };

        let cart_id = CartId::from_string(&column::<String>(&row, "id")?).map_err(decode_failed("カートID"))?;
        let created_at: DateTime<Utc> = column(&row, "created_at")?;
        let updated_at: DateTime<Utc> = column(&row, "updated_at")?;

        let lines = sqlx::query(lines_sql)
            .bind(cart_id.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_failed("カート明細の取得"))?
            .iter()
            .map(line_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart::reconstruct(cart_id, user_id, created_at, updated_at, lines)))
    }
}

#[async_trait]
impl CartRepository for MySqlUnitOfWork {
    async fn lock_or_create(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<Cart, RepositoryError> {
        // user_idの一意制約により、同時に作成されても1ユーザー1カートになる
        sqlx::query(INSERT_CART_IF_ABSENT)
            .bind(CartId::new().to_string())
            .bind(user_id.to_string())
            .bind(now)
            .bind(now)
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("カートの作成"))?;

        self.load_cart(user_id, true).await?.ok_or_else(|| {
            RepositoryError::OperationFailed(format!("カートを作成できませんでした: {}", user_id))
        })
    }

    async fn lock_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.load_cart(user_id, true).await
    }

    async fn find_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.load_cart(user_id, false).await
    }

    async fn find_line(
        &mut self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query(
            "SELECT product_id, quantity, unit_price FROM cart_lines WHERE cart_id = ? AND product_id = ?",
        )
        .bind(cart_id.to_string())
        .bind(product_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(query_failed("カート明細の取得"))?;

        row.as_ref().map(line_from_row).transpose()
    }

    async fn save_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (cart_id, product_id, quantity, unit_price)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                quantity = VALUES(quantity),
                unit_price = VALUES(unit_price)
            "#,
        )
        .bind(cart_id.to_string())
        .bind(line.product_id().to_string())
        .bind(line.quantity())
        .bind(line.unit_price().amount())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("カート明細の保存"))?;

        Ok(())
    }

    async fn delete_line(&mut self, cart_id: CartId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_lines WHERE cart_id = ? AND product_id = ?")
            .bind(cart_id.to_string())
            .bind(product_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("カート明細の削除"))?;
        Ok(())
    }

    async fn clear(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_lines WHERE cart_id = ?")
            .bind(cart_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("カートのクリア"))?;
        Ok(())
    }

    async fn touch(&mut self, cart_id: CartId, now: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(cart_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("カートの更新"))?;
        Ok(())
    }

    async fn delete(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        // 明細はON DELETE CASCADEで削除される
        sqlx::query("DELETE FROM carts WHERE id = ?")
            .bind(cart_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("カートの削除"))?;
        Ok(())
    }
}
