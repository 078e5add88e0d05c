// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use conveyor::{ContextData, ConveyorError, Pipeline, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn runs_steps_in_declared_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("one", false, None), ("two", false, None), ("three", false, None)]);
  // Registered out of order on purpose.
  pipeline.on_root("three", recording_handler("three"));
  pipeline.on_root("one", recording_handler("one"));
  pipeline.on_root("two", recording_handler("two"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.trail, vec!["one", "two", "three"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_phases_run_in_sequence() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("persist", false, None)]);
  pipeline.after_root("persist", recording_handler("after"));
  pipeline.on_root("persist", recording_handler("on"));
  pipeline.before_root("persist", recording_handler("before"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().trail, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_handlers_and_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false, None), ("b", false, None), ("c", false, None)]);
  pipeline.on_root("a", recording_handler("a"));
  pipeline.on_root("b", recording_handler("b"));
  pipeline.after_root("b", recording_handler("b_after"));
  pipeline.on_root("c", recording_handler("c"));

  let ctx = ContextData::new(TestContext {
    stop_at: Some("b".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().trail, vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn first_handler_error_is_returned() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("good", false, None), ("bad", false, None), ("never", false, None)]);
  pipeline.on_root("good", recording_handler("good"));
  pipeline.on_root("bad", failing_handler("bad", "card declined"));
  pipeline.on_root("never", recording_handler("never"));

  let ctx = ContextData::new(TestContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("card declined".to_string()));
  assert_eq!(ctx.read().trail, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_against_current_state() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("first", false, None),
    (
      "skipped_when_counter_positive",
      false,
      Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
    ),
    ("last", false, None),
  ]);
  pipeline.on_root("first", recording_handler("first"));
  pipeline.on_root("skipped_when_counter_positive", recording_handler("middle"));
  pipeline.on_root("last", recording_handler("last"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("work", false, None), ("notify", true, None)]);
  pipeline.on_root("work", recording_handler("work"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["work"]);
}

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("unwired", false, None)]);
  let err = pipeline.run(ContextData::new(TestContext::default())).await.unwrap_err();

  match err {
    TestError::Conveyor(msg) => {
      assert!(msg.contains("HandlerMissing"));
      assert!(msg.contains("unwired"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn pipeline_can_use_conveyor_error_directly() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, ConveyorError>::new(&[("task", false, None)]);

  match pipeline.run(ContextData::new(TestContext::default())).await {
    Err(ConveyorError::HandlerMissing { step_name }) => assert_eq!(step_name, "task"),
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[test]
#[should_panic(expected = "not part of this pipeline")]
fn registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("typo", recording_handler("typo"));
}
