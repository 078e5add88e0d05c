// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod catalog_handlers;
pub mod checkout_handlers;
pub mod upload_handlers;
pub mod webhook_handlers;
