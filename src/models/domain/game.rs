use crate::errors::error::AppError;
use crate::utils::is_zero_address;
use ethers_core::abi::Token;
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// 合约 GameStatus 枚举在缓存表里的文本形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    None,
    Pending,
    Active,
    VerificationPending,
    Solved,
    Archived,
}

impl GameStatus {
    /// 未知取值按 pending 处理
    pub fn from_chain(value: u8) -> Self {
        match value {
            0 => GameStatus::None,
            1 => GameStatus::Pending,
            2 => GameStatus::Active,
            3 => GameStatus::VerificationPending,
            4 => GameStatus::Solved,
            5 => GameStatus::Archived,
            _ => GameStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::None => "none",
            GameStatus::Pending => "pending",
            GameStatus::Active => "active",
            GameStatus::VerificationPending => "verification_pending",
            GameStatus::Solved => "solved",
            GameStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleType {
    Riddle,
    Math,
    Other,
}

impl PuzzleType {
    pub fn from_chain(value: u8) -> Self {
        match value {
            0 => PuzzleType::Riddle,
            1 => PuzzleType::Math,
            _ => PuzzleType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PuzzleType::Riddle => "riddle",
            PuzzleType::Math => "math",
            PuzzleType::Other => "other",
        }
    }
}

/// 列表接口的 status 过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// active + verification_pending
    Active,
    Pending,
    /// solved + archived
    Solved,
    All,
    /// 未识别的取值：active + verification_pending + pending
    Open,
}

impl StatusFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("active") => StatusFilter::Active,
            Some("pending") => StatusFilter::Pending,
            Some("solved") => StatusFilter::Solved,
            Some("all") => StatusFilter::All,
            Some(_) => StatusFilter::Open,
        }
    }

    /// None 表示不过滤
    pub fn statuses(&self) -> Option<&'static [GameStatus]> {
        match self {
            StatusFilter::Active => Some(&[GameStatus::Active, GameStatus::VerificationPending]),
            StatusFilter::Pending => Some(&[GameStatus::Pending]),
            StatusFilter::Solved => Some(&[GameStatus::Solved, GameStatus::Archived]),
            StatusFilter::All => None,
            StatusFilter::Open => Some(&[
                GameStatus::Active,
                GameStatus::VerificationPending,
                GameStatus::Pending,
            ]),
        }
    }

    pub fn matches(&self, status: &str) -> bool {
        match self.statuses() {
            None => true,
            Some(list) => list.iter().any(|s| s.as_str() == status),
        }
    }
}

/// getGameDetails 返回元组的第一个结构体
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameDetails {
    pub puzzle: String,
    pub solution_hash: [u8; 32],
    pub status: u8,
    pub pot: U256,
    pub entry_fee: U256,
    pub token: Address,
    pub proposer: Address,
    pub winner: Address,
    pub vote_threshold: U256,
    pub challenge_threshold: U256,
    pub puzzle_type: u8,
    pub require_submission_fee: bool,
    pub exists: bool,
    pub first_solver: Address,
    pub oracle_params: String,
    pub verification_deadline: U256,
}

impl GameDetails {
    /// 原生币游戏才能由服务端钱包代付
    pub fn is_native_token(&self) -> bool {
        is_zero_address(&self.token)
    }

    pub fn game_status(&self) -> GameStatus {
        GameStatus::from_chain(self.status)
    }

    pub fn puzzle_kind(&self) -> PuzzleType {
        PuzzleType::from_chain(self.puzzle_type)
    }

    /// 解码 getGameDetails 的输出 (tuple, uint256, uint256, uint256)
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self, AppError> {
        let first = tokens
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ParserError("getGameDetails returned no values".into()))?;
        let fields = match first {
            Token::Tuple(fields) => fields,
            other => {
                return Err(AppError::ParserError(format!(
                    "getGameDetails: expected tuple, got {:?}",
                    other
                )));
            }
        };
        if fields.len() != 16 {
            return Err(AppError::ParserError(format!(
                "getGameDetails: expected 16 fields, got {}",
                fields.len()
            )));
        }
        let mut it = fields.into_iter();
        let mut next = |name: &str| {
            it.next()
                .ok_or_else(|| AppError::ParserError(format!("getGameDetails: missing {}", name)))
        };

        Ok(Self {
            puzzle: as_string(next("puzzle")?, "puzzle")?,
            solution_hash: as_bytes32(next("solutionHash")?, "solutionHash")?,
            status: as_u8(next("status")?, "status")?,
            pot: as_uint(next("pot")?, "pot")?,
            entry_fee: as_uint(next("entryFee")?, "entryFee")?,
            token: as_address(next("token")?, "token")?,
            proposer: as_address(next("proposer")?, "proposer")?,
            winner: as_address(next("winner")?, "winner")?,
            vote_threshold: as_uint(next("voteThreshold")?, "voteThreshold")?,
            challenge_threshold: as_uint(next("challengeThreshold")?, "challengeThreshold")?,
            puzzle_type: as_u8(next("puzzleType")?, "puzzleType")?,
            require_submission_fee: as_bool(next("requireSubmissionFee")?, "requireSubmissionFee")?,
            exists: as_bool(next("exists")?, "exists")?,
            first_solver: as_address(next("firstSolver")?, "firstSolver")?,
            oracle_params: as_string(next("oracleParams")?, "oracleParams")?,
            verification_deadline: as_uint(next("verificationDeadline")?, "verificationDeadline")?,
        })
    }
}

fn mismatch(name: &str, token: &Token) -> AppError {
    AppError::ParserError(format!("getGameDetails: unexpected {} token {:?}", name, token))
}

fn as_string(token: Token, name: &str) -> Result<String, AppError> {
    match token {
        Token::String(s) => Ok(s),
        other => Err(mismatch(name, &other)),
    }
}

fn as_uint(token: Token, name: &str) -> Result<U256, AppError> {
    match token {
        Token::Uint(v) => Ok(v),
        other => Err(mismatch(name, &other)),
    }
}

fn as_u8(token: Token, name: &str) -> Result<u8, AppError> {
    let value = as_uint(token, name)?;
    if value > U256::from(u8::MAX) {
        return Err(AppError::ParserError(format!(
            "getGameDetails: {} out of uint8 range: {}",
            name, value
        )));
    }
    Ok(value.low_u32() as u8)
}

fn as_address(token: Token, name: &str) -> Result<Address, AppError> {
    match token {
        Token::Address(a) => Ok(a),
        other => Err(mismatch(name, &other)),
    }
}

fn as_bool(token: Token, name: &str) -> Result<bool, AppError> {
    match token {
        Token::Bool(b) => Ok(b),
        other => Err(mismatch(name, &other)),
    }
}

fn as_bytes32(token: Token, name: &str) -> Result<[u8; 32], AppError> {
    match token {
        Token::FixedBytes(bytes) if bytes.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(&bytes);
            Ok(out)
        }
        other => Err(mismatch(name, &other)),
    }
}
