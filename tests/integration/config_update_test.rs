//! Configuration Update Integration Tests
//!
//! on_configuration_updated() replaces the index wholesale under the
//! `always` policy and only rebuilds a non-ready pipeline under
//! `when_not_ready`.

use rag_pipeline::models::settings::ReinitializePolicy;
use rag_pipeline::services::knowledge::{PipelineError, PipelineState, RagPipeline};
use rag_pipeline::PipelineSettings;

use super::support::{scripted_backends, settings_with_seed, Faults};

const JAPAN: &str = "Tokyo is the capital of Japan.";

async fn answer_text(pipeline: &mut RagPipeline, question: &str) -> String {
    pipeline
        .answer(question, "rag-pipeline", &[], &serde_json::Value::Null)
        .await
        .collect_text()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_update_replaces_index() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(settings_with_seed(
        "The capital of France is Paris. The capital of Italy is Rome.",
    ), backends);
    pipeline.startup().await.unwrap();

    let state = pipeline
        .on_configuration_updated(settings_with_seed(JAPAN))
        .await
        .unwrap();
    assert_eq!(state, PipelineState::Ready);
    assert_eq!(faults.builds(), 2);

    let answer = answer_text(&mut pipeline, "What is the capital of Japan?").await;
    assert!(answer.contains("Tokyo"), "unexpected answer: {answer}");

    // The old corpus is gone, not merged.
    let answer = answer_text(&mut pipeline, "What is the capital of France?").await;
    assert!(!answer.contains("Paris"), "old corpus still indexed: {answer}");
    assert_eq!(pipeline.index().unwrap().corpus().documents()[0].content, JAPAN);
}

#[tokio::test]
async fn test_update_from_uninitialized_builds() {
    let (backends, _faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(settings_with_seed("Paris is in France."), backends);

    let state = pipeline
        .on_configuration_updated(settings_with_seed(JAPAN))
        .await
        .unwrap();
    assert_eq!(state, PipelineState::Ready);
    assert_eq!(pipeline.settings().seed_text, JAPAN);
}

#[tokio::test]
async fn test_failed_update_build_is_returned() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(settings_with_seed("Paris is in France."), backends);
    pipeline.startup().await.unwrap();
    Faults::set(&faults.fail_embedder, 1);

    let err = pipeline
        .on_configuration_updated(settings_with_seed(JAPAN))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::IndexBuild(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    // The new settings are kept so a later startup builds from them.
    assert_eq!(pipeline.settings().seed_text, JAPAN);

    assert_eq!(pipeline.startup().await.unwrap(), PipelineState::Ready);
    let answer = answer_text(&mut pipeline, "What is the capital of Japan?").await;
    assert!(answer.contains("Tokyo"), "unexpected answer: {answer}");
}

#[tokio::test]
async fn test_invalid_update_fails_without_building() {
    let (backends, faults) = scripted_backends();
    let mut pipeline = RagPipeline::new(settings_with_seed("Paris is in France."), backends);
    pipeline.startup().await.unwrap();

    let mut settings = settings_with_seed(JAPAN);
    settings.retrieval.chunk_size = 0;
    let err = pipeline.on_configuration_updated(settings).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert_eq!(faults.builds(), 1);
}

#[tokio::test]
async fn test_when_not_ready_keeps_ready_index() {
    let (backends, faults) = scripted_backends();
    let when_not_ready = |seed: &str| PipelineSettings {
        reinitialize_on_update: ReinitializePolicy::WhenNotReady,
        ..settings_with_seed(seed)
    };
    let mut pipeline = RagPipeline::new(when_not_ready("The capital of France is Paris."), backends);
    pipeline.startup().await.unwrap();

    let state = pipeline
        .on_configuration_updated(when_not_ready(JAPAN))
        .await
        .unwrap();
    assert_eq!(state, PipelineState::Ready);
    assert_eq!(faults.builds(), 1);

    let answer = answer_text(&mut pipeline, "What is the capital of France?").await;
    assert!(answer.contains("Paris"), "unexpected answer: {answer}");
}

#[tokio::test]
async fn test_when_not_ready_rebuilds_failed_pipeline() {
    let (backends, faults) = scripted_backends();
    let settings = PipelineSettings {
        reinitialize_on_update: ReinitializePolicy::WhenNotReady,
        ..settings_with_seed(JAPAN)
    };
    Faults::set(&faults.fail_embedder, 1);
    let mut pipeline = RagPipeline::new(settings.clone(), backends);
    assert!(pipeline.startup().await.is_err());

    let state = pipeline.on_configuration_updated(settings).await.unwrap();
    assert_eq!(state, PipelineState::Ready);
    assert_eq!(faults.builds(), 2);
}
