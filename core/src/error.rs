// core/src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConveyorError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No pipeline registered for context type {type_name}")]
  PipelineNotRegistered { type_name: String },

  #[error("Context type mismatch: expected {expected_type}")]
  TypeMismatch { expected_type: String },
}

pub type ConveyorResult<T, E = ConveyorError> = std::result::Result<T, E>;
