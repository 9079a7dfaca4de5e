//! Handler for casting votes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use goodvibes_core::error::CoreError;
use goodvibes_core::store::VoteReceipt;
use goodvibes_core::types::{DbId, DeviceId};
use goodvibes_db::repositories::{VoteOutcome, VoteRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects/{id}/votes`.
#[derive(Debug, Deserialize, Validate)]
pub struct CastVoteRequest {
    /// The voting device's anonymous identifier.
    #[validate(length(min = 1, max = 128))]
    pub voter_id: String,
}

/// POST /api/v1/projects/{id}/votes
///
/// Returns 201 when the vote was counted and 200 with `counted: false` when
/// this voter had already voted; both carry the current counter.
pub async fn cast(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CastVoteRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<VoteReceipt>>)> {
    input.validate()?;
    let voter_id = input.voter_id.trim();
    if voter_id.is_empty() {
        return Err(CoreError::Validation("voter_id must not be blank".into()).into());
    }
    let voter = DeviceId::from(voter_id);

    let (status, receipt) = match VoteRepo::cast(&state.pool, id, &voter).await? {
        VoteOutcome::Counted(votes) => {
            tracing::info!(project_id = id, votes, "Vote counted");
            (
                StatusCode::CREATED,
                VoteReceipt {
                    project_id: id,
                    votes,
                    counted: true,
                },
            )
        }
        VoteOutcome::AlreadyCounted(votes) => {
            tracing::debug!(project_id = id, "Duplicate vote ignored");
            (
                StatusCode::OK,
                VoteReceipt {
                    project_id: id,
                    votes,
                    counted: false,
                },
            )
        }
        VoteOutcome::NotOpen(status) => {
            return Err(CoreError::Conflict(format!(
                "Project {id} is not open for voting (status: {status})"
            ))
            .into())
        }
        VoteOutcome::NotFound => return Err(CoreError::project_not_found(id).into()),
    };

    Ok((status, Json(DataResponse { data: receipt })))
}
