// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod product;
mod cart;
mod order;
mod checkout_summary;

pub use value_objects::{
    CartId, OrderId, ProductId, UserId,
    Money,
    DeliveryDetails,
    OrderStatus,
};

pub use product::Product;
pub use cart::{Cart, CartLine};
pub use order::{snapshot_lines, Order, OrderLine};
pub use checkout_summary::{CheckoutSummary, FLAT_SHIPPING_FEE_CENTS, FREE_SHIPPING_THRESHOLD_CENTS};
