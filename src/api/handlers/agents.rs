use crate::api::dto::AgentsResponse;
use crate::api::state::AppState;
use crate::errors::error::AppError;
use axum::Json;
use axum::extract::State;

/// 排行榜：wins 降序，捐赠额次之
pub async fn list_agents(State(state): State<AppState>) -> Result<Json<AgentsResponse>, AppError> {
    let rows = state.games.agents().await?;
    Ok(Json(AgentsResponse {
        ok: true,
        agents: rows.into_iter().map(Into::into).collect(),
    }))
}
