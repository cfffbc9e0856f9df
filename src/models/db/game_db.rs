use crate::errors::error::AppError;
use crate::models::db::schema::games;
use crate::models::domain::game::GameDetails;
use crate::utils::{address_opt_to_string, address_to_string, u256_to_bigdecimal, u256_to_i64, unix_seconds_to_datetime};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};

/// 写入/覆盖用的行，created_at 交给数据库默认值
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = games)]
#[diesel(treat_none_as_null = true)]
pub struct GameUpsert {
    pub id: i64,
    pub puzzle: String,
    pub status: String,
    pub pot: BigDecimal,
    pub entry_fee: BigDecimal,
    pub token_address: String,
    pub proposer_address: String,
    pub winner_address: Option<String>,
    pub vote_threshold: i64,
    pub challenge_threshold: i64,
    pub puzzle_type: String,
    pub require_submission_fee: bool,
    pub first_solver_address: Option<String>,
    pub oracle_params: String,
    pub verification_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GameRecord {
    pub id: i64,
    pub puzzle: String,
    pub status: String,
    pub pot: BigDecimal,
    pub entry_fee: BigDecimal,
    pub token_address: String,
    pub proposer_address: String,
    pub winner_address: Option<String>,
    pub vote_threshold: i64,
    pub challenge_threshold: i64,
    pub puzzle_type: String,
    pub require_submission_fee: bool,
    pub first_solver_address: Option<String>,
    pub oracle_params: String,
    pub verification_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GameUpsert {
    /// 链上详情 → 缓存行；零地址写 NULL，deadline 为 0 写 NULL
    pub fn from_details(id: i64, details: &GameDetails) -> Result<Self, AppError> {
        Ok(Self {
            id,
            puzzle: details.puzzle.clone(),
            status: details.game_status().as_str().to_string(),
            pot: u256_to_bigdecimal(details.pot),
            entry_fee: u256_to_bigdecimal(details.entry_fee),
            token_address: address_to_string(&details.token),
            proposer_address: address_to_string(&details.proposer),
            winner_address: address_opt_to_string(&details.winner),
            vote_threshold: u256_to_i64(details.vote_threshold)?,
            challenge_threshold: u256_to_i64(details.challenge_threshold)?,
            puzzle_type: details.puzzle_kind().as_str().to_string(),
            require_submission_fee: details.require_submission_fee,
            first_solver_address: address_opt_to_string(&details.first_solver),
            oracle_params: details.oracle_params.clone(),
            verification_deadline: unix_seconds_to_datetime(details.verification_deadline)?,
        })
    }

    pub fn into_record(self, created_at: DateTime<Utc>) -> GameRecord {
        GameRecord {
            id: self.id,
            puzzle: self.puzzle,
            status: self.status,
            pot: self.pot,
            entry_fee: self.entry_fee,
            token_address: self.token_address,
            proposer_address: self.proposer_address,
            winner_address: self.winner_address,
            vote_threshold: self.vote_threshold,
            challenge_threshold: self.challenge_threshold,
            puzzle_type: self.puzzle_type,
            require_submission_fee: self.require_submission_fee,
            first_solver_address: self.first_solver_address,
            oracle_params: self.oracle_params,
            verification_deadline: self.verification_deadline,
            created_at,
        }
    }
}
