//! Integration Tests Module
//!
//! End-to-end tests for the pipeline controller, driven through its public
//! API with the offline extractive model, TF-IDF embeddings and scripted
//! fault-injecting backends.

// Shared fixtures and scripted backends
mod support;

// Readiness, build-then-query, idempotent startup, stream completeness
mod pipeline_test;

// One-shot recovery in answer()
mod recovery_test;

// Configuration update rebuilds
mod config_update_test;
