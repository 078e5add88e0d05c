// storefront/src/lib.rs

//! Keepsake: storefront backend for personalised photo keepsakes. Checkout
//! and payment webhooks run as `conveyor` pipelines over hosted payment,
//! email, key-value and blob services.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod web;
