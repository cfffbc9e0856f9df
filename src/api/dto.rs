use crate::errors::error::AppError;
use crate::models::db::game_db::GameRecord;
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::domain::game::GameDetails;
use crate::services::game_service::ProposeParams;
use crate::services::tx::types::TxResult;
use crate::utils::{address_to_string, h256_to_string, wei_to_string};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// 数字字段：JSON 数字，或十进制 / 0x 十六进制字符串
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    pub fn to_u256(&self, field: &str) -> Result<U256, AppError> {
        let invalid = || AppError::Validation(format!("Invalid {}", field));
        match self {
            NumericInput::Number(n) => n.as_u64().map(U256::from).ok_or_else(invalid),
            NumericInput::Text(s) => parse_u256(s).ok_or_else(invalid),
        }
    }
}

pub fn parse_u256(raw: &str) -> Option<U256> {
    let s = raw.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return U256::from_str_radix(hex, 16).ok();
    }
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(s).ok()
}

fn required_u256(value: &Option<NumericInput>, field: &str) -> Result<U256, AppError> {
    value
        .as_ref()
        .ok_or_else(|| AppError::Validation(format!("Invalid {}", field)))?
        .to_u256(field)
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(AppError::Validation(format!("Invalid {}", field))),
    }
}

/// 可以安全放进 JSON 数字的用数字，否则退回十进制字符串
pub fn uint_json(value: U256) -> Value {
    if value <= U256::from(u64::MAX) {
        Value::from(value.as_u64())
    } else {
        Value::String(value.to_string())
    }
}

fn parse_bytes32(raw: &str) -> Option<[u8; 32]> {
    let s = raw.trim();
    let hex_part = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    let bytes = hex::decode(hex_part).ok()?;
    bytes.try_into().ok()
}

// ---------- 请求 ----------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    pub puzzle: Option<String>,
    pub solution_hash: Option<String>,
    pub entry_fee: Option<NumericInput>,
    pub token: Option<String>,
    pub vote_threshold: Option<NumericInput>,
    pub puzzle_type: Option<NumericInput>,
    pub oracle_params: Option<String>,
}

impl ProposeRequest {
    pub fn into_params(self) -> Result<ProposeParams, AppError> {
        let puzzle = required_text(self.puzzle, "puzzle")?;
        let solution_hash = match self.solution_hash.as_deref() {
            None => [0u8; 32],
            Some(raw) => parse_bytes32(raw)
                .ok_or_else(|| AppError::Validation("Invalid solutionHash".into()))?,
        };
        let entry_fee = required_u256(&self.entry_fee, "entryFee")?;
        let token = match self.token.as_deref() {
            None => Address::zero(),
            Some(raw) => Address::from_str(raw.trim())
                .map_err(|_| AppError::Validation("Invalid token".into()))?,
        };
        let vote_threshold = required_u256(&self.vote_threshold, "voteThreshold")?;
        if vote_threshold.is_zero() {
            return Err(AppError::Validation("Invalid voteThreshold".into()));
        }
        let puzzle_type = required_u256(&self.puzzle_type, "puzzleType")?;
        if puzzle_type > U256::from(u8::MAX) {
            return Err(AppError::Validation("Invalid puzzleType".into()));
        }

        Ok(ProposeParams {
            puzzle,
            solution_hash,
            entry_fee,
            token,
            vote_threshold,
            puzzle_type: puzzle_type.as_u32() as u8,
            oracle_params: self.oracle_params.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIdRequest {
    pub game_id: Option<NumericInput>,
}

impl GameIdRequest {
    pub fn game_id(&self) -> Result<U256, AppError> {
        required_u256(&self.game_id, "gameId")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub game_id: Option<NumericInput>,
    pub approve: Option<bool>,
}

impl VoteRequest {
    pub fn validate(&self) -> Result<(U256, bool), AppError> {
        let id = required_u256(&self.game_id, "gameId")?;
        let approve = self
            .approve
            .ok_or_else(|| AppError::Validation("Invalid approve".into()))?;
        Ok((id, approve))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub game_id: Option<NumericInput>,
    pub solution: Option<String>,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<(U256, String), AppError> {
        let id = required_u256(&self.game_id, "gameId")?;
        Ok((id, required_text(self.solution, "solution")?))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub game_id: Option<NumericInput>,
    pub reason: Option<String>,
}

impl ChallengeRequest {
    pub fn validate(self) -> Result<(U256, String), AppError> {
        let id = required_u256(&self.game_id, "gameId")?;
        Ok((id, required_text(self.reason, "reason")?))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateRequest {
    pub game_id: Option<NumericInput>,
    pub amount_wei: Option<NumericInput>,
}

impl DonateRequest {
    pub fn validate(&self) -> Result<(U256, U256), AppError> {
        let id = required_u256(&self.game_id, "gameId")?;
        Ok((id, required_u256(&self.amount_wei, "amountWei")?))
    }
}

/// ?start&limit&status
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    /// (start, limit)，limit 最大 200
    pub fn page(&self) -> Result<(i64, i64), AppError> {
        let start = parse_page_value(self.start.as_deref(), 0, "start")?;
        let limit = parse_page_value(self.limit.as_deref(), DEFAULT_PAGE_LIMIT, "limit")?;
        Ok((start, limit.min(MAX_PAGE_LIMIT)))
    }
}

fn parse_page_value(raw: Option<&str>, default: i64, field: &str) -> Result<i64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| AppError::Validation(format!("Invalid {}", field))),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub payment_payload: Option<Value>,
    pub payment_requirements: Option<Value>,
}

// ---------- 响应 ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResponse {
    pub ok: bool,
    pub tx_hash: String,
    pub status: &'static str,
}

impl From<&TxResult> for TxResponse {
    fn from(tx: &TxResult) -> Self {
        Self {
            ok: true,
            tx_hash: h256_to_string(tx.tx_hash),
            status: TX_MINED,
        }
    }
}

/// 链上 revert 在广播环节就转成错误，能走到响应的交易都已成功上链
pub const TX_MINED: &str = "success";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeResponse {
    pub ok: bool,
    pub tx_hash: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdsResponse {
    pub ok: bool,
    pub ids: Vec<Value>,
}

impl IdsResponse {
    pub fn new(ids: Vec<U256>) -> Self {
        Self {
            ok: true,
            ids: ids.into_iter().map(uint_json).collect(),
        }
    }
}

/// 链上读出的游戏详情
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    pub puzzle: String,
    pub status: u8,
    pub pot: String,
    pub entry_fee: String,
    pub token: String,
    pub proposer: String,
    pub winner: String,
    pub vote_threshold: Value,
    pub challenge_threshold: Value,
    pub puzzle_type: u8,
    pub require_submission_fee: bool,
    pub exists: bool,
    pub first_solver: String,
    pub oracle_params: String,
    pub verification_deadline: Value,
}

impl From<GameDetails> for GameDto {
    fn from(g: GameDetails) -> Self {
        Self {
            status: g.status,
            pot: g.pot.to_string(),
            entry_fee: g.entry_fee.to_string(),
            token: address_to_string(&g.token),
            proposer: address_to_string(&g.proposer),
            winner: address_to_string(&g.winner),
            vote_threshold: uint_json(g.vote_threshold),
            challenge_threshold: uint_json(g.challenge_threshold),
            puzzle_type: g.puzzle_type,
            require_submission_fee: g.require_submission_fee,
            exists: g.exists,
            first_solver: address_to_string(&g.first_solver),
            verification_deadline: uint_json(g.verification_deadline),
            puzzle: g.puzzle,
            oracle_params: g.oracle_params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub ok: bool,
    pub game: GameDto,
}

/// 缓存表里的游戏行
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedGameDto {
    pub id: String,
    pub puzzle: String,
    pub status: String,
    pub pot: String,
    pub entry_fee: String,
    pub token: String,
    pub proposer: String,
    pub winner: Option<String>,
    pub vote_threshold: i64,
    pub challenge_threshold: i64,
    pub puzzle_type: String,
    pub require_submission_fee: bool,
    pub first_solver: Option<String>,
    pub oracle_params: String,
    pub verification_deadline: i64,
    pub created_at: String,
}

impl From<GameRecord> for CachedGameDto {
    fn from(r: GameRecord) -> Self {
        Self {
            id: r.id.to_string(),
            pot: wei_to_string(&r.pot),
            entry_fee: wei_to_string(&r.entry_fee),
            verification_deadline: r.verification_deadline.map(|d| d.timestamp()).unwrap_or(0),
            created_at: r.created_at.to_rfc3339(),
            puzzle: r.puzzle,
            status: r.status,
            token: r.token_address,
            proposer: r.proposer_address,
            winner: r.winner_address,
            vote_threshold: r.vote_threshold,
            challenge_threshold: r.challenge_threshold,
            puzzle_type: r.puzzle_type,
            require_submission_fee: r.require_submission_fee,
            first_solver: r.first_solver_address,
            oracle_params: r.oracle_params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CachedGamesResponse {
    pub ok: bool,
    pub games: Vec<CachedGameDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultFeeResponse {
    pub ok: bool,
    pub default_fee: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDto {
    pub address: String,
    pub wins: i64,
    pub total_donated: String,
}

impl From<LeaderboardRow> for AgentDto {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            total_donated: wei_to_string(&row.total_donated),
            address: row.address,
            wins: row.wins,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub ok: bool,
    pub agents: Vec<AgentDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numeric(v: Value) -> NumericInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn numeric_input_accepts_numbers_and_strings() {
        assert_eq!(numeric(json!(7)).to_u256("gameId").unwrap(), U256::from(7u64));
        assert_eq!(numeric(json!("12")).to_u256("gameId").unwrap(), U256::from(12u64));
        assert_eq!(numeric(json!("0x1f")).to_u256("gameId").unwrap(), U256::from(31u64));
        assert_eq!(
            numeric(json!("1000000000000000000")).to_u256("entryFee").unwrap(),
            U256::exp10(18)
        );
    }

    #[test]
    fn numeric_input_rejects_garbage() {
        for bad in [json!(-1), json!(1.5), json!("abc"), json!(""), json!("0x"), json!("-3")] {
            let err = numeric(bad).to_u256("gameId").unwrap_err();
            assert_eq!(err.to_string(), "Invalid gameId");
        }
    }

    #[test]
    fn propose_defaults_token_and_hash() {
        let req: ProposeRequest = serde_json::from_value(json!({
            "puzzle": "What is 6 x 7?",
            "entryFee": "1000000000000000000",
            "voteThreshold": 3,
            "puzzleType": 1
        }))
        .unwrap();
        let params = req.into_params().unwrap();
        assert_eq!(params.token, Address::zero());
        assert_eq!(params.solution_hash, [0u8; 32]);
        assert_eq!(params.puzzle_type, 1);
        assert_eq!(params.oracle_params, "");
    }

    #[test]
    fn propose_rejects_zero_threshold_and_bad_hash() {
        let req: ProposeRequest = serde_json::from_value(json!({
            "puzzle": "p", "entryFee": 1, "voteThreshold": 0, "puzzleType": 0
        }))
        .unwrap();
        assert_eq!(req.into_params().unwrap_err().to_string(), "Invalid voteThreshold");

        let req: ProposeRequest = serde_json::from_value(json!({
            "puzzle": "p", "entryFee": 1, "voteThreshold": 1, "puzzleType": 0,
            "solutionHash": "0x1234"
        }))
        .unwrap();
        assert_eq!(req.into_params().unwrap_err().to_string(), "Invalid solutionHash");
    }

    #[test]
    fn page_defaults_and_clamp() {
        let q = ListQuery::default();
        assert_eq!(q.page().unwrap(), (0, 50));
        let q = ListQuery {
            start: Some("10".into()),
            limit: Some("1000".into()),
            status: None,
        };
        assert_eq!(q.page().unwrap(), (10, 200));
        let q = ListQuery {
            start: Some("-1".into()),
            ..ListQuery::default()
        };
        assert!(matches!(q.page(), Err(AppError::Validation(_))));
    }

    #[test]
    fn uint_json_switches_to_string_for_huge_values() {
        assert_eq!(uint_json(U256::from(5u64)), json!(5));
        assert_eq!(uint_json(U256::MAX), json!(U256::MAX.to_string()));
    }

    #[test]
    fn tx_response_shape() {
        let tx = TxResult {
            tx_hash: ethers_core::types::H256::repeat_byte(0x0a),
            receipt: Default::default(),
        };
        let body = serde_json::to_value(TxResponse::from(&tx)).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["status"], "success");
        assert_eq!(body["txHash"], format!("0x{}", "0a".repeat(32)));
    }
}
