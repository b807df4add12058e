//! Structured fan-out over member model calls.
//!
//! The protocol's only concurrency: leader-election ballots, seconding
//! responses, and motion ballots fan out here and are fully joined before
//! any event is emitted. Results come back in *input* order (member turn
//! order), never arrival order. A cancellation observed mid-fan-out aborts
//! every outstanding call; any transport error aborts the fan-out and is
//! fatal.

use super::run_session::types::SessionError;
use crate::ports::{CompletionOptions, ModelClient};
use council_domain::JsonOutcome;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One prepared model call.
pub(crate) struct FanOutCall {
    pub member_id: String,
    pub client: Arc<dyn ModelClient>,
    pub system: String,
    pub user: String,
    pub opts: CompletionOptions,
}

/// Run all calls concurrently; join them all; return outcomes in input
/// order.
pub(crate) async fn collect_json(
    calls: Vec<FanOutCall>,
    cancel: &CancellationToken,
) -> Result<Vec<JsonOutcome>, SessionError> {
    let mut join_set = JoinSet::new();

    for (index, call) in calls.into_iter().enumerate() {
        join_set.spawn(async move {
            let result = call
                .client
                .complete_json(&call.system, &call.user, &call.opts)
                .await;
            (index, call.member_id, result)
        });
    }

    let mut slots: Vec<Option<JsonOutcome>> = Vec::new();
    slots.resize_with(join_set.len(), || None);

    loop {
        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                join_set.abort_all();
                return Err(SessionError::Cancelled);
            }
            joined = join_set.join_next() => joined,
        };

        let Some(joined) = joined else {
            break; // all tasks complete
        };

        match joined {
            Ok((index, _member_id, Ok(outcome))) => {
                slots[index] = Some(outcome);
            }
            Ok((_, member_id, Err(error))) => {
                warn!(member_id = %member_id, error = %error, "model call failed, aborting fan-out");
                join_set.abort_all();
                return Err(SessionError::Model(error));
            }
            Err(join_error) => {
                join_set.abort_all();
                return Err(SessionError::Join(join_error.to_string()));
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| slot.expect("every fan-out slot is filled after join"))
        .collect())
}

/// One sequential model call, still honoring cancellation.
pub(crate) async fn call_json(
    client: Arc<dyn ModelClient>,
    system: &str,
    user: &str,
    opts: &CompletionOptions,
    cancel: &CancellationToken,
) -> Result<JsonOutcome, SessionError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
        result = client.complete_json(system, user, opts) => Ok(result?),
    }
}

/// One sequential free-text call, still honoring cancellation.
pub(crate) async fn call_text(
    client: Arc<dyn ModelClient>,
    system: &str,
    user: &str,
    opts: &CompletionOptions,
    cancel: &CancellationToken,
) -> Result<String, SessionError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
        result = client.complete_text(system, user, opts) => Ok(result?),
    }
}
