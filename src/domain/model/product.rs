use crate::domain::error::DomainError;
use crate::domain::model::{Money, ProductId};

/// 商品（カタログ集約のうち、このコアが参照・更新する部分）
/// `stock`は利用可能在庫数であり、負になることはない
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Money,
    stock: u32,
    active: bool,
}

impl Product {
    /// 新しい商品を作成
    ///
    /// # Arguments
    /// * `id` - 商品ID
    /// * `name` - 商品名
    /// * `price` - 現在のカタログ価格
    /// * `stock` - 利用可能在庫数
    pub fn new(id: ProductId, name: String, price: Money, stock: u32) -> Self {
        Self {
            id,
            name,
            price,
            stock,
            active: true,
        }
    }

    /// データベースから取得したデータで商品を再構築
    pub fn reconstruct(id: ProductId, name: String, price: Money, stock: u32, active: bool) -> Self {
        Self {
            id,
            name,
            price,
            stock,
            active,
        }
    }

    /// 商品IDを取得
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// 商品名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 現在のカタログ価格を取得
    pub fn price(&self) -> Money {
        self.price
    }

    /// 利用可能在庫数を取得
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// 販売中かどうか
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// カタログ価格を変更
    /// 既存のカート明細・注文明細の単価には影響しない
    pub fn change_price(&mut self, price: Money) {
        self.price = price;
    }

    /// 販売状態を変更
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// 指定された数量の在庫が利用可能かチェック
    /// 要求数量 `q` と在庫 `s` について `q <= s` のときのみ続行できる
    ///
    /// # Returns
    /// * `true` - 在庫が十分にある
    /// * `false` - 在庫が不足している
    pub fn has_available_stock(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }

    /// 在庫チェックを行い、不足していれば利用可能数を含むエラーを返す
    pub fn ensure_available(&self, quantity: u32) -> Result<(), DomainError> {
        if !self.has_available_stock(quantity) {
            return Err(DomainError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
            });
        }
        Ok(())
    }

    /// 販売中であることを確認する
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::ProductInactive(self.id));
        }
        Ok(())
    }
}
