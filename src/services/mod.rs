/// Admin operations on matches, results, predictions and overrides.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Leaderboard materialization and read access.
pub mod leaderboard_service;
/// Prediction ingestion.
pub mod prediction_service;
/// Public read-only match listing.
pub mod public_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
