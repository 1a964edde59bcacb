/// Persisted entity definitions.
pub mod models;
/// Storage abstraction layer shared by every backend.
pub mod storage;
/// Tournament persistence and its backends.
pub mod tournament_store;
