// storefront/src/services/mod.rs

//! Clients for the hosted services the storefront is glued to, each behind a
//! trait with an HTTP implementation and an in-memory one.

pub mod auth_service;
pub mod blob;
pub mod email;
pub mod email_mock;
pub mod kv;
pub mod order_store;
pub mod payment_mock;
pub mod payments;
pub mod resend;
pub mod stripe;
pub mod templates;
pub mod webhook_signature;
