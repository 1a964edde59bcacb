use std::future::Future;

use crate::{error::ServiceError, services::leaderboard_service, state::SharedState};

/// Execute a mutation under the recompute gate, then rebuild, persist and
/// broadcast the leaderboard.
///
/// When `work` fails nothing is recomputed. When the recompute itself fails
/// the mutation stays applied and the previous leaderboard remains published.
pub async fn run_mutation_with_recompute<F, Fut, T>(
    state: &SharedState,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    state
        .run_exclusive(move || async move {
            let value = work().await?;
            leaderboard_service::materialize(state).await?;
            Ok(value)
        })
        .await
}
