// storefront/src/pipelines/order_status_pipeline.rs

use conveyor::{Conveyor, ContextData, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::info;

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::contexts::OrderStatusCtxData;
use crate::services::email::OrderEmailKind;
use crate::state::AppState;

pub fn register_order_status_pipeline(registry: &Arc<Conveyor<AppError>>, _app_state: &AppState) {
  let not_shipped: SkipCondition<OrderStatusCtxData> =
    Arc::new(|ctx_data: ContextData<OrderStatusCtxData>| ctx_data.read().status != Some(OrderStatus::Shipped));

  let mut p = Pipeline::<OrderStatusCtxData, AppError>::new(&[
    ("validate_request", false, None),
    ("apply_status", false, None),
    ("notify_shipped", true, Some(not_shipped)),
  ]);

  p.on_root("validate_request", |ctx_data: ContextData<OrderStatusCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let id = guard.order_id.trim().to_string();
      let requested = guard.requested_status.trim().to_string();
      if id.is_empty() || requested.is_empty() {
        return Err(AppError::Validation("Missing id/status".to_string()));
      }
      let status: OrderStatus = requested
        .parse()
        .map_err(|e: crate::models::order::UnknownStatus| AppError::Validation(e.to_string()))?;
      guard.order_id = id;
      guard.status = Some(status);
      guard.tracking_number = guard
        .tracking_number
        .take()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("apply_status", |ctx_data: ContextData<OrderStatusCtxData>| {
    Box::pin(async move {
      let (orders, id, status, tracking) = {
        let guard = ctx_data.read();
        let status = guard
          .status
          .ok_or_else(|| AppError::Internal("Status missing after validation".to_string()))?;
        (
          guard.app_state.orders.clone(),
          guard.order_id.clone(),
          status,
          guard.tracking_number.clone(),
        )
      };
      let order = orders
        .update_status(&id, status, tracking)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
      info!(order_id = %order.id, status = %order.status, "Order status changed.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_shipped", |ctx_data: ContextData<OrderStatusCtxData>| {
    Box::pin(async move {
      let (notifier, order) = {
        let guard = ctx_data.read();
        (guard.app_state.notifier.clone(), guard.order.clone())
      };
      if let Some(order) = order {
        notifier.send_order_emails(&order, OrderEmailKind::Shipped).await?;
        ctx_data.write().shipped_email_sent = true;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Order status pipeline registered.");
}
