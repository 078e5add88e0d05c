// storefront/src/models/mod.rs

//! Storefront domain types: the fixed catalog, the cart and persisted orders.

pub mod cart;
pub mod catalog;
pub mod money;
pub mod order;

pub use cart::{Cart, CartLine, ShippingZone};
pub use catalog::{Product, ProductOption};
pub use money::format_gbp;
pub use order::{Order, OrderItem, OrderStatus, ShippingAddress};
