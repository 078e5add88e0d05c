// src/lib.rs

//! Conveyor: a small async step-pipeline engine.
//!
//! A pipeline is an ordered list of named steps. Each step owns `before`,
//! `on` and `after` handlers that receive a shared [`ContextData`] and decide
//! whether the run continues or stops. Pipelines are registered in a
//! [`Conveyor`] registry keyed by the type of data they operate on, so a web
//! handler only needs to build the context and call [`Conveyor::run`].

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{ConveyorError, ConveyorResult};

pub use crate::registry::Conveyor;
