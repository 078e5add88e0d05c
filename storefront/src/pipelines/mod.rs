// storefront/src/pipelines/mod.rs

//! Pipelines for the storefront's multi-step flows, registered on the shared
//! `Conveyor` at startup.

use conveyor::Conveyor;
use std::sync::Arc;

use crate::errors::AppError;
use crate::state::AppState;

pub mod contexts;

pub mod checkout_pipeline;
pub mod order_status_pipeline;
pub mod webhook_pipeline;

pub fn register_all_pipelines(registry: &Arc<Conveyor<AppError>>, app_state: &AppState) {
  checkout_pipeline::register_checkout_pipeline(registry, app_state);
  webhook_pipeline::register_payment_webhook_pipeline(registry, app_state);
  order_status_pipeline::register_order_status_pipeline(registry, app_state);
  tracing::info!("All storefront pipelines registered.");
}
