use crate::errors::error::AppError;
use crate::models::db::donation_db::DonationInsert;
use crate::models::db::game_db::{GameRecord, GameUpsert};
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::domain::game::StatusFilter;
use async_trait::async_trait;

/// 缓存库访问接口，不含业务逻辑
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 按主键插入或整行覆盖
    async fn upsert_game(&self, row: &GameUpsert) -> Result<(), AppError>;

    /// 按 id 升序分页
    async fn list_games(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<GameRecord>, AppError>;

    async fn insert_donation(&self, row: &DonationInsert) -> Result<(), AppError>;

    /// wins 降序，total_donated 降序
    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>, AppError>;
}
