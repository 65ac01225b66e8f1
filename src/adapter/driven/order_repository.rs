use super::mysql_store::{column, decode_failed, query_failed, MySqlUnitOfWork};
use crate::domain::model::{
    DeliveryDetails, Money, Order, OrderId, OrderLine, OrderStatus, ProductId, UserId,
};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;

/// 注文ヘッダーと明細をJOINで取得する
/// 明細の列は該当行がない場合NULLになる
const SELECT_ORDERS_WITH_LINES: &str = r#"
    SELECT
        o.id, o.user_id, o.status, o.delivery_address, o.contact_phone, o.total, o.created_at,
        ol.product_id, ol.quantity, ol.unit_price
    FROM orders o
    LEFT JOIN order_lines ol ON o.id = ol.order_id
"#;

fn order_line_from_row(row: &MySqlRow) -> Result<Option<OrderLine>, RepositoryError> {
    let (Some(product_id), Some(quantity), Some(unit_price)) = (
        column::<Option<String>>(row, "product_id")?,
        column::<Option<u32>>(row, "quantity")?,
        column::<Option<Decimal>>(row, "unit_price")?,
    ) else {
        return Ok(None);
    };

    let product_id = ProductId::from_string(&product_id).map_err(decode_failed("商品ID"))?;
    let unit_price = Money::new(unit_price).map_err(decode_failed("単価"))?;
    OrderLine::new(product_id, quantity, unit_price)
        .map(Some)
        .map_err(decode_failed("注文明細"))
}

fn order_header_from_row(row: &MySqlRow) -> Result<Order, RepositoryError> {
    let id = OrderId::from_string(&column::<String>(row, "id")?).map_err(decode_failed("注文ID"))?;
    let user_id = UserId::from_string(&column::<String>(row, "user_id")?).map_err(decode_failed("ユーザーID"))?;
    let status = OrderStatus::from_string(&column::<String>(row, "status")?)
        .map_err(decode_failed("注文ステータス"))?;
    let delivery = DeliveryDetails::new(column(row, "delivery_address")?, column(row, "contact_phone")?)
        .map_err(decode_failed("配達先"))?;
    let total = Money::new(column::<Decimal>(row, "total")?).map_err(decode_failed("合計金額"))?;

    Ok(Order::reconstruct(
        id,
        user_id,
        column(row, "created_at")?,
        delivery,
        status,
        total,
        Vec::new(),
    ))
}

/// JOINされた結果から注文のリストを構築する
/// 行は注文ごとに連続している前提で、SQLの並び順をそのまま保つ
fn build_orders_from_rows(rows: &[MySqlRow]) -> Result<Vec<Order>, RepositoryError> {
    let mut orders: Vec<Order> = Vec::new();
    let mut lines: Vec<Vec<OrderLine>> = Vec::new();

    for row in rows {
        let header = order_header_from_row(row)?;
        if orders.last().map(Order::id) != Some(header.id()) {
            orders.push(header);
            lines.push(Vec::new());
        }
        if let (Some(line), Some(current)) = (order_line_from_row(row)?, lines.last_mut()) {
            current.push(line);
        }
    }

    Ok(orders
        .into_iter()
        .zip(lines)
        .map(|(order, lines)| {
            Order::reconstruct(
                order.id(),
                order.user_id(),
                order.created_at(),
                order.delivery().clone(),
                order.status(),
                order.total(),
                lines,
            )
        })
        .collect())
}

impl MySqlUnitOfWork {
    async fn fetch_orders(
        &mut self,
        condition: &str,
        bind: String,
        context: &'static str,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "{} WHERE {} ORDER BY o.created_at DESC, o.id, ol.id",
            SELECT_ORDERS_WITH_LINES, condition
        );
        let rows = sqlx::query(&sql)
            .bind(bind)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_failed(context))?;

        build_orders_from_rows(&rows)
    }

    async fn fetch_order(&mut self, order_id: OrderId, locking: bool) -> Result<Option<Order>, RepositoryError> {
        let sql = if locking {
            "SELECT id, user_id, status, delivery_address, contact_phone, total, created_at FROM orders WHERE id = ? FOR UPDATE"
        } else {
            "SELECT id, user_id, status, delivery_address, contact_phone, total, created_at FROM orders WHERE id = ?"
        };
        let Some(row) = sqlx::query(sql)
            .bind(order_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_failed("注文の取得"))?
        else {
            return Ok(None);
        };

        let header = order_header_from_row(&row)?;
        let lines = self.find_lines(order_id).await?;
        Ok(Some(Order::reconstruct(
            header.id(),
            header.user_id(),
            header.created_at(),
            header.delivery().clone(),
            header.status(),
            header.total(),
            lines,
        )))
    }
}

#[async_trait]
impl OrderRepository for MySqlUnitOfWork {
    async fn insert(&mut self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, delivery_address, contact_phone, total, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.user_id().to_string())
        .bind(order.status().to_string())
        .bind(order.delivery().address())
        .bind(order.delivery().contact_phone())
        .bind(order.total().amount())
        .bind(order.created_at())
        .execute(&mut *self.tx)
        .await
        .map_err(query_failed("注文の保存"))?;

        for line in order.lines() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(order.id().to_string())
            .bind(line.product_id().to_string())
            .bind(line.quantity())
            .bind(line.unit_price().amount())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("注文明細の保存"))?;
        }

        Ok(())
    }

    async fn find_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.fetch_order(order_id, false).await
    }

    async fn lock_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.fetch_order(order_id, true).await
    }

    async fn find_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, unit_price FROM order_lines WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_failed("注文明細の取得"))?;

        Ok(rows
            .iter()
            .map(order_line_from_row)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect())
    }

    async fn find_by_user(&mut self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.fetch_orders("o.user_id = ?", user_id.to_string(), "注文履歴の取得")
            .await
    }

    async fn find_by_status(&mut self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        self.fetch_orders("o.status = ?", status.to_string(), "ステータス別注文一覧の取得")
            .await
    }

    async fn update_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(order_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_failed("注文ステータスの更新"))?;
        Ok(())
    }
}
