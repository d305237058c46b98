//! Recovery Integration Tests
//!
//! answer() runs at most one initialize-and-retry cycle per call:
//! - a single backend failure is recovered transparently
//! - a failed retrieval (query embedding) is recovered the same way
//! - two failures in a row yield one failure and no third backend call
//! - a failed recovery build leaves the pipeline Failed
//! - auto_recover_on_missing_index builds on demand and counts as the recovery

use rag_pipeline::services::knowledge::{PipelineState, QueryResult, RagPipeline};
use rag_pipeline::PipelineSettings;

use super::support::{offline_settings, scripted_backends, Faults};

const QUESTION: &str = "What is the capital of France?";

async fn ask(pipeline: &mut RagPipeline) -> QueryResult {
    pipeline
        .answer(QUESTION, "rag-pipeline", &[], &serde_json::Value::Null)
        .await
}

fn auto_recover_settings() -> PipelineSettings {
    PipelineSettings {
        auto_recover_on_missing_index: true,
        ..offline_settings()
    }
}

#[tokio::test]
async fn test_single_failure_is_recovered() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    let old_id = pipeline.index().unwrap().id().to_string();
    Faults::set(&faults.fail_submit, 1);

    let answer = ask(&mut pipeline).await.collect_text().await.unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");

    assert_eq!(faults.submits(), 2);
    assert_eq!(faults.builds(), 2);
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_ne!(pipeline.index().unwrap().id(), old_id);
}

#[tokio::test]
async fn test_two_failures_yield_one_failure_without_third_call() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    Faults::set(&faults.fail_submit, 2);

    let result = ask(&mut pipeline).await;
    assert_eq!(
        result.failure_message(),
        Some("Query failed: Network error: connection refused")
    );
    assert_eq!(faults.submits(), 2);
    assert_eq!(faults.builds(), 2);
    // The rebuilt index is valid; only the retried query failed.
    assert_eq!(pipeline.state(), PipelineState::Ready);

    // The next call starts with a fresh budget and succeeds.
    assert!(ask(&mut pipeline).await.is_success());
    assert_eq!(faults.submits(), 3);
}

#[tokio::test]
async fn test_retrieval_failure_is_recovered() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    let old_id = pipeline.index().unwrap().id().to_string();
    Faults::set(&faults.fail_query_embed, 1);

    let answer = ask(&mut pipeline).await.collect_text().await.unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");

    // The model is only reached by the retried query.
    assert_eq!(faults.submits(), 1);
    assert_eq!(faults.builds(), 2);
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_ne!(pipeline.index().unwrap().id(), old_id);
}

#[tokio::test]
async fn test_repeated_retrieval_failure_is_reported() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    Faults::set(&faults.fail_query_embed, 2);

    let result = ask(&mut pipeline).await;
    assert_eq!(
        result.failure_message(),
        Some("Query failed: network error: embedding endpoint timed out")
    );
    assert_eq!(faults.submits(), 0);
    assert_eq!(faults.builds(), 2);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_failed_recovery_build_marks_failed() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    Faults::set(&faults.fail_submit, 1);
    Faults::set(&faults.fail_embedder, 1);

    let result = ask(&mut pipeline).await;
    let message = result.failure_message().unwrap().to_string();
    assert!(message.starts_with("Recovery failed: Index build failed:"), "{message}");
    assert_eq!(faults.submits(), 1);
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(pipeline.index().is_none());

    let result = ask(&mut pipeline).await;
    assert_eq!(
        result.failure_message(),
        Some("Index not initialized. Please check startup logs.")
    );
}

#[tokio::test]
async fn test_auto_recover_builds_missing_index() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(auto_recover_settings(), backends);
    assert_eq!(pipeline.state(), PipelineState::Uninitialized);

    let answer = ask(&mut pipeline).await.collect_text().await.unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_eq!(faults.builds(), 1);
}

#[tokio::test]
async fn test_auto_recover_counts_as_the_single_recovery() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(auto_recover_settings(), backends);
    Faults::set(&faults.fail_submit, 1);

    let result = ask(&mut pipeline).await;
    assert!(!result.is_success());
    assert_eq!(faults.builds(), 1);
    assert_eq!(faults.submits(), 1);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_auto_recover_build_failure_is_in_band() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(auto_recover_settings(), backends);
    Faults::set(&faults.fail_model, 1);

    let result = ask(&mut pipeline).await;
    let message = result.failure_message().unwrap();
    assert!(message.starts_with("Recovery failed:"), "{message}");
    assert!(message.contains("model unavailable"), "{message}");
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(faults.builds(), 0);
}
