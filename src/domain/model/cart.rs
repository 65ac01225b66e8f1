use crate::domain::error::DomainError;
use crate::domain::model::{CartId, Money, Product, ProductId, UserId};
use chrono::{DateTime, Utc};
use std::iter;

/// カート明細
/// 単価は明細作成時のカタログ価格を保持し、表示のたびに再取得しない
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
}

impl CartLine {
    /// 新しいカート明細を作成
    /// 数量は1以上で、小計が金額の範囲に収まる必要がある
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let subtotal = unit_price.multiply(quantity)?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }

    /// 商品IDを取得
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// 数量を取得
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 単価を取得
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// 小計（単価 × 数量）
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}

/// カート集約
/// ユーザーごとに1つだけ存在し、商品ごとに明細は最大1つ
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    lines: Vec<CartLine>,
}

impl Cart {
    /// 新しい空のカートを作成
    pub fn new(id: CartId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            created_at: now,
            updated_at: now,
            lines: Vec::new(),
        }
    }

    /// データベースから取得したデータでカートを再構築
    pub fn reconstruct(
        id: CartId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        lines: Vec<CartLine>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            updated_at,
            lines,
        }
    }

    pub fn id(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// カート明細のリストを取得
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// 指定された商品の明細を取得
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 合計金額（単価 × 数量の総和）
    /// 明細の組み合わせが金額の上限を超える場合はエラー
    pub fn total(&self) -> Result<Money, DomainError> {
        sum_subtotals(self.lines.iter())
    }

    /// 商品点数（数量の総和）
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(CartLine::quantity).sum()
    }

    /// 商品をカートに追加
    /// 同じ商品の明細が既にある場合は数量を加算する
    ///
    /// 事前条件:
    /// - 数量が1以上
    /// - 商品が販売中
    /// - 加算後の明細数量が利用可能在庫以下
    /// - 変更後の合計が金額の範囲に収まる
    ///
    /// いずれかを満たさない場合、カートは一切変更されない
    pub fn add_product(
        &mut self,
        product: &Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<&CartLine, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        product.ensure_active()?;

        let position = self.position_of(product.id());
        let current = position.map_or(0, |index| self.lines[index].quantity);
        let merged = current
            .checked_add(quantity)
            .ok_or(DomainError::InvalidQuantity)?;
        product.ensure_available(merged)?;

        // 既存明細は追加時の単価を保つ
        let unit_price = position.map_or(product.price(), |index| self.lines[index].unit_price);
        let line = CartLine::new(product.id(), merged, unit_price)?;
        self.put_line(position, line, now)
    }

    /// 明細の数量を絶対値で設定（加算ではなく置き換え）
    /// 明細が存在しない商品は`ProductNotInCart`
    pub fn set_quantity(
        &mut self,
        product: &Product,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<&CartLine, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        let index = self
            .position_of(product.id())
            .ok_or(DomainError::ProductNotInCart(product.id()))?;
        product.ensure_active()?;
        product.ensure_available(quantity)?;

        let line = CartLine::new(product.id(), quantity, self.lines[index].unit_price)?;
        self.put_line(Some(index), line, now)
    }

    /// 商品の明細を削除
    ///
    /// # Returns
    /// * `true` - 明細を削除した
    /// * `false` - 明細が存在しなかった
    pub fn remove_product(&mut self, product_id: ProductId, now: DateTime<Utc>) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        let removed = self.lines.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// すべての明細を削除（カート自体は残る）
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.updated_at = now;
    }

    fn position_of(&self, product_id: ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id == product_id)
    }

    /// `position`の明細を置き換える（`None`なら末尾に追加）
    /// 置き換え後の合計が計算できない場合は何も変更しない
    fn put_line(
        &mut self,
        position: Option<usize>,
        line: CartLine,
        now: DateTime<Utc>,
    ) -> Result<&CartLine, DomainError> {
        let others = self
            .lines
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != position)
            .map(|(_, other)| other);
        sum_subtotals(others.chain(iter::once(&line)))?;

        let index = match position {
            Some(index) => {
                self.lines[index] = line;
                index
            }
            None => {
                self.lines.push(line);
                self.lines.len() - 1
            }
        };
        self.updated_at = now;
        Ok(&self.lines[index])
    }
}

fn sum_subtotals<'a>(mut lines: impl Iterator<Item = &'a CartLine>) -> Result<Money, DomainError> {
    lines.try_fold(Money::zero(), |acc, line| acc.add(&line.subtotal))
}
