use crate::domain::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// UUIDをラップした識別子型を定義する
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// 新しい一意の識別子を生成
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// UUIDから識別子を作成
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から識別子を作成
            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                let uuid = Uuid::parse_str(s)?;
                Ok(Self(uuid))
            }

            /// 内部のUUIDを取得
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

uuid_identifier!(
    /// ユーザーの一意識別子（認証は外部で解決済み）
    UserId
);

uuid_identifier!(
    /// 商品の一意識別子
    /// 在庫行を決まった順序でロックするため`Ord`を実装する
    ProductId
);

uuid_identifier!(
    /// カートの一意識別子
    CartId
);

uuid_identifier!(
    /// 注文の一意識別子
    OrderId
);

/// 金額を表す値オブジェクト
/// 0以上、小数点以下2桁まで、`DECIMAL(12, 2)`に収まる範囲のみ存在する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// 小数点以下の最大桁数
    pub const SCALE: u32 = 2;

    /// 表現できる金額の上限（この値は含まない）: 10^10
    fn upper_bound() -> Decimal {
        Decimal::from(10_000_000_000u64)
    }

    /// 金額から作成
    /// 負の金額、3桁以上の小数、上限以上の金額はエラー
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::InvalidValue(format!(
                "金額は0以上である必要があります: {}",
                amount
            )));
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(DomainError::InvalidValue(format!(
                "金額の小数点以下は{}桁までです: {}",
                Self::SCALE,
                amount
            )));
        }
        if amount >= Self::upper_bound() {
            return Err(DomainError::InvalidValue(format!(
                "金額が上限を超えています: {}",
                amount
            )));
        }
        Ok(Self { amount })
    }

    /// 最小通貨単位（セント）から作成
    /// `u32`の範囲は常に上限内に収まる
    pub fn from_cents(cents: u32) -> Self {
        Self {
            amount: Decimal::new(i64::from(cents), Self::SCALE),
        }
    }

    /// 0円
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
        }
    }

    /// 金額を取得
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// 金額を加算
    /// 結果が上限以上ならエラー
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| Self::overflow(self, "+", other.amount))?;
        Money::new(sum)
    }

    /// 金額を乗算
    /// 結果が上限以上ならエラー
    pub fn multiply(&self, factor: u32) -> Result<Money, DomainError> {
        let product = self
            .amount
            .checked_mul(Decimal::from(factor))
            .ok_or_else(|| Self::overflow(self, "*", Decimal::from(factor)))?;
        Money::new(product)
    }

    fn overflow(left: &Money, op: &str, right: Decimal) -> DomainError {
        DomainError::InvalidValue(format!("金額の計算が範囲外です: {} {} {}", left.amount, op, right))
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.amount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.amount)
    }
}

/// 配送情報を表す値オブジェクト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    address: String,
    contact_phone: String,
}

impl DeliveryDetails {
    /// 新しい配送情報を作成
    /// バリデーション:
    /// - 住所は空でない必要がある
    /// - 電話番号は空でなく、数字・空白・`+-()`のみで構成される必要がある
    pub fn new(address: String, contact_phone: String) -> Result<Self, DomainError> {
        let address = address.trim().to_string();
        let contact_phone = contact_phone.trim().to_string();

        if address.is_empty() {
            return Err(DomainError::InvalidDeliveryDetails(
                "配送先住所は空にできません".to_string(),
            ));
        }
        if !Self::is_valid_phone(&contact_phone) {
            return Err(DomainError::InvalidDeliveryDetails(
                "連絡先電話番号の形式が不正です".to_string(),
            ));
        }

        Ok(Self {
            address,
            contact_phone,
        })
    }

    fn is_valid_phone(phone: &str) -> bool {
        phone.chars().any(|c| c.is_ascii_digit())
            && phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    }

    /// 配送先住所を取得
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 連絡先電話番号を取得
    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }
}

/// 注文のステータス
/// Created → (Delivered | Cancelled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// 作成済み（初期状態）
    Created,
    /// 配達完了（終端）
    Delivered,
    /// キャンセル済み（終端）
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_str = match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", status_str)
    }
}

impl OrderStatus {
    /// 文字列からOrderStatusを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(DomainError::InvalidValue(format!(
                "無効な注文ステータス: {}",
                s
            ))),
        }
    }

    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}
