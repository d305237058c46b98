//! Pipeline Controller Integration Tests
//!
//! - answer() before initialization reports "not initialized" in-band
//! - build-then-query answers from the seed text
//! - startup() is idempotent
//! - answer streams are finite and end at the first error

use futures_util::StreamExt;
use serde_json::json;

use rag_pipeline::models::settings::CorpusSourceKind;
use rag_pipeline::services::knowledge::{
    Backends, PipelineError, PipelineState, QueryResult, RagPipeline,
};
use rag_pipeline_llm::Message;

use super::support::{offline_settings, scripted_backends, settings_with_seed, Faults};

const NOT_INITIALIZED: &str = "Index not initialized. Please check startup logs.";

async fn ask(pipeline: &mut RagPipeline, question: &str) -> QueryResult {
    pipeline
        .answer(question, "rag-pipeline", &[], &serde_json::Value::Null)
        .await
}

// ============================================================================
// Readiness
// ============================================================================

#[tokio::test]
async fn test_answer_before_initialize_is_in_band_failure() {
    let mut pipeline = RagPipeline::new(offline_settings(), Backends::default());

    let items: Vec<String> = ask(&mut pipeline, "What is the capital of France?")
        .await
        .into_stream()
        .collect()
        .await;
    assert_eq!(items, vec![NOT_INITIALIZED.to_string()]);
    assert_eq!(pipeline.state(), PipelineState::Uninitialized);
}

#[tokio::test]
async fn test_answer_after_failed_startup_is_not_initialized() {
    let (backends, faults) = scripted_backends();
    Faults::set(&faults.fail_embedder, 1);
    let mut pipeline = RagPipeline::new(offline_settings(), backends);

    let err = pipeline.startup().await.unwrap_err();
    assert!(matches!(err, PipelineError::IndexBuild(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(pipeline.last_error().unwrap().starts_with("Index build failed:"));

    let result = ask(&mut pipeline, "What is the capital of France?").await;
    assert_eq!(result.failure_message(), Some(NOT_INITIALIZED));
    assert_eq!(faults.submits(), 0);
}

#[tokio::test]
async fn test_eager_create_failure_is_returned() {
    let (backends, faults) = scripted_backends();
    Faults::set(&faults.fail_model, 1);
    let settings = rag_pipeline::PipelineSettings {
        eager_initialize: true,
        ..offline_settings()
    };

    let err = RagPipeline::create(settings, backends).await.unwrap_err();
    assert!(err.to_string().contains("model unavailable"));
}

// ============================================================================
// Build then query
// ============================================================================

#[tokio::test]
async fn test_build_then_query_answers_paris() {
    let mut pipeline = RagPipeline::new(offline_settings(), Backends::default());
    pipeline.initialize().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert!(pipeline.index().is_some());

    let answer = ask(&mut pipeline, "What is the capital of France?")
        .await
        .collect_text()
        .await
        .unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");
}

#[tokio::test]
async fn test_eager_create_is_ready() {
    let settings = rag_pipeline::PipelineSettings {
        eager_initialize: true,
        ..settings_with_seed("Berlin is the capital of Germany. Madrid is the capital of Spain.")
    };
    let mut pipeline = RagPipeline::create(settings, Backends::default())
        .await
        .unwrap();
    assert_eq!(pipeline.state(), PipelineState::Ready);

    let answer = ask(&mut pipeline, "Which city is the capital of Spain?")
        .await
        .collect_text()
        .await
        .unwrap();
    assert!(answer.contains("Madrid"), "unexpected answer: {answer}");
}

#[tokio::test]
async fn test_builtin_corpus_and_test_query() {
    let settings = rag_pipeline::PipelineSettings {
        corpus_source: CorpusSourceKind::Builtin,
        ..offline_settings()
    };
    let mut pipeline = RagPipeline::new(settings, Backends::default());
    pipeline.startup().await.unwrap();

    // Empty message falls back to "What is AI?"
    let answer = ask(&mut pipeline, "").await.collect_text().await.unwrap();
    assert!(answer.contains("Artificial Intelligence"), "unexpected answer: {answer}");
}

#[tokio::test]
async fn test_host_arguments_do_not_drive_the_query() {
    let mut pipeline = RagPipeline::new(offline_settings(), Backends::default());
    pipeline.startup().await.unwrap();

    let history = vec![
        Message::user("What is the capital of Italy?"),
        Message::assistant("Rome."),
    ];
    let body = json!({ "model": "other-model", "stream": true });
    let answer = pipeline
        .answer("What is the capital of France?", "other-model", &history, &body)
        .await
        .collect_text()
        .await
        .unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");
}

// ============================================================================
// Idempotent startup
// ============================================================================

#[tokio::test]
async fn test_startup_twice_builds_once() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);

    assert_eq!(pipeline.startup().await.unwrap(), PipelineState::Ready);
    let first_id = pipeline.index().unwrap().id().to_string();
    assert_eq!(pipeline.startup().await.unwrap(), PipelineState::Ready);

    assert_eq!(faults.builds(), 1);
    assert_eq!(pipeline.index().unwrap().id(), first_id);
}

#[tokio::test]
async fn test_startup_after_failure_rebuilds() {
    let (backends, faults) = scripted_backends();
    Faults::set(&faults.fail_embedder, 1);
    let mut pipeline = RagPipeline::new(offline_settings(), backends);

    assert!(pipeline.startup().await.is_err());
    assert_eq!(pipeline.startup().await.unwrap(), PipelineState::Ready);
    assert_eq!(faults.builds(), 2);
}

#[tokio::test]
async fn test_shutdown_is_not_a_state_transition() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    let index_id = pipeline.index().unwrap().id().to_string();

    pipeline.shutdown().await;
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert_eq!(pipeline.index().unwrap().id(), index_id);

    let answer = ask(&mut pipeline, "What is the capital of France?")
        .await
        .collect_text()
        .await
        .unwrap();
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");

    // startup after shutdown finds the index still built.
    assert_eq!(pipeline.startup().await.unwrap(), PipelineState::Ready);
    assert_eq!(faults.builds(), 1);
}

// ============================================================================
// Stream completeness
// ============================================================================

#[tokio::test]
async fn test_stream_is_finite_and_non_empty() {
    let mut pipeline = RagPipeline::new(offline_settings(), Backends::default());
    pipeline.startup().await.unwrap();

    let result = ask(&mut pipeline, "What is the capital of Italy?").await;
    let tokens = match result {
        QueryResult::Success(tokens) => tokens,
        QueryResult::Failure(message) => panic!("unexpected failure: {message}"),
    };
    let items: Vec<Result<String, PipelineError>> = tokens.collect().await;

    assert!(items.len() > 1);
    assert!(items.iter().all(|item| item.is_ok()));
    let text: String = items.into_iter().map(|item| item.unwrap()).collect();
    assert_eq!(text, "The capital of Italy is Rome.");
}

#[tokio::test]
async fn test_no_tokens_after_stream_error() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(offline_settings(), backends);
    pipeline.startup().await.unwrap();
    Faults::set(&faults.break_stream, 1);

    let result = ask(&mut pipeline, "What is the capital of France?").await;
    assert!(result.is_success());
    let items: Vec<String> = result.into_stream().collect().await;
    assert_eq!(
        items,
        vec![
            "The ".to_string(),
            "Stream interrupted: connection reset".to_string()
        ]
    );

    // In-stream errors are the host's to see; they do not trigger recovery.
    assert_eq!(faults.builds(), 1);
    assert_eq!(faults.submits(), 1);
    assert_eq!(pipeline.state(), PipelineState::Ready);
}
