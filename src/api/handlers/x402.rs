//! /api/x402/* 路由
use crate::api::dto::{
    CachedGamesResponse, ChallengeRequest, DefaultFeeResponse, DonateRequest, GameIdRequest,
    GameResponse, IdsResponse, ListQuery, NumericInput, ProposeRequest, ProposeResponse,
    SubmitRequest, TxResponse, VoteRequest, TX_MINED,
};
use crate::api::state::AppState;
use crate::errors::error::AppError;
use crate::models::domain::game::StatusFilter;
use crate::utils::h256_to_string;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};

type ApiResult<T> = Result<Json<T>, AppError>;

pub async fn propose(
    State(state): State<AppState>,
    body: Result<Json<ProposeRequest>, JsonRejection>,
) -> ApiResult<ProposeResponse> {
    let Json(req) = body?;
    let outcome = state.games.propose(req.into_params()?).await?;
    Ok(Json(ProposeResponse {
        ok: true,
        tx_hash: h256_to_string(outcome.tx.tx_hash),
        status: TX_MINED,
        game_id: outcome.game_id.map(|id| id.to_string()),
    }))
}

pub async fn vote(
    State(state): State<AppState>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let (id, approve) = req.validate()?;
    let tx = state.games.vote(id, approve).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn submit(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let (id, solution) = req.validate()?;
    let tx = state.games.submit(id, &solution).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn challenge(
    State(state): State<AppState>,
    body: Result<Json<ChallengeRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let (id, reason) = req.validate()?;
    let tx = state.games.challenge(id, reason).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn donate(
    State(state): State<AppState>,
    body: Result<Json<DonateRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let (id, amount) = req.validate()?;
    let tx = state.games.donate(id, amount).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn finalize(
    State(state): State<AppState>,
    body: Result<Json<GameIdRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let tx = state.games.finalize(req.game_id()?).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn invalidate(
    State(state): State<AppState>,
    body: Result<Json<GameIdRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let tx = state.games.invalidate(req.game_id()?).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn reset(
    State(state): State<AppState>,
    body: Result<Json<GameIdRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = body?;
    let tx = state.games.reset(req.game_id()?).await?;
    Ok(Json(TxResponse::from(&tx)))
}

pub async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<IdsResponse> {
    let Query(q) = query?;
    let (start, limit) = q.page()?;
    let filter = StatusFilter::parse(q.status.as_deref());
    let ids = state.games.list_game_ids(filter, start, limit).await?;
    Ok(Json(IdsResponse::new(ids)))
}

/// 待投票的提案
pub async fn list_proposals(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<IdsResponse> {
    let Query(q) = query?;
    let (start, limit) = q.page()?;
    let ids = state
        .games
        .list_game_ids(StatusFilter::Pending, start, limit)
        .await?;
    Ok(Json(IdsResponse::new(ids)))
}

pub async fn list_cached_games(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<CachedGamesResponse> {
    let Query(q) = query?;
    let (start, limit) = q.page()?;
    let filter = StatusFilter::parse(q.status.as_deref());
    let rows = state.games.list_cached_games(filter, start, limit).await?;
    Ok(Json(CachedGamesResponse {
        ok: true,
        games: rows.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GameResponse> {
    let id = NumericInput::Text(id).to_u256("id")?;
    let game = state.games.get_game(id).await?;
    Ok(Json(GameResponse {
        ok: true,
        game: game.into(),
    }))
}

pub async fn default_fee(State(state): State<AppState>) -> ApiResult<DefaultFeeResponse> {
    let fee = state.games.default_fee().await?;
    Ok(Json(DefaultFeeResponse {
        ok: true,
        default_fee: fee.to_string(),
    }))
}
