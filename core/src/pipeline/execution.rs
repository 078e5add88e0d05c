// core/src/pipeline/execution.rs

//! `Pipeline::run`.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::ConveyorError;
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use tracing::{event, instrument, Instrument, Level};

#[derive(Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  fn label(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<ConveyorError> + Send + Sync + 'static,
{
  fn handlers_for<'a>(
    table: &'a HashMap<String, Vec<Handler<TData, Err>>>,
    step_name: &str,
  ) -> &'a [Handler<TData, Err>] {
    table.get(step_name).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Runs one phase of one step. `Some(Stopped)` ends the pipeline.
  async fn run_phase(
    &self,
    phase: Phase,
    handlers: &[Handler<TData, Err>],
    ctx_data: &ContextData<TData>,
  ) -> Result<Option<PipelineResult>, Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let span = tracing::debug_span!("step_handler", phase = phase.label(), handler_index = handler_idx);
      match handler_fn(ctx_data.clone()).instrument(span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, phase = phase.label(), "Pipeline stopped by handler.");
          return Ok(Some(PipelineResult::Stopped));
        }
        Err(e) => {
          event!(Level::ERROR, phase = phase.label(), error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(None)
  }

  /// Executes every step in order against `ctx_data`.
  ///
  /// A required step with no handlers at all fails with
  /// `ConveyorError::HandlerMissing`, converted into `Err`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_cond) = &step_def.skip_if {
        if skip_cond(ctx_data.clone()) {
          event!(Level::DEBUG, step = step_name, step_index = step_idx, "Step skipped by condition.");
          continue;
        }
      }

      let before = Self::handlers_for(&self.before, step_name);
      let on = Self::handlers_for(&self.on, step_name);
      let after = Self::handlers_for(&self.after, step_name);

      if before.is_empty() && on.is_empty() && after.is_empty() {
        if step_def.optional {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step = step_name, "Required step has no handlers.");
        return Err(Err::from(ConveyorError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let step_span = tracing::info_span!("pipeline_step", step = step_name, step_index = step_idx);
      let phases = [(Phase::Before, before), (Phase::On, on), (Phase::After, after)];
      for (phase, handlers) in phases {
        if let Some(stopped) = self.run_phase(phase, handlers, &ctx_data).instrument(step_span.clone()).await? {
          return Ok(stopped);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(PipelineResult::Completed)
  }
}
