use crate::database::diesel::AsyncDbPool;
use crate::errors::error::AppError;
use crate::models::db::donation_db::DonationInsert;
use crate::models::db::game_db::{GameRecord, GameUpsert};
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::domain::game::StatusFilter;
use crate::repositories::donation_repository::DonationRepository;
use crate::repositories::game_repository::GameRepository;
use crate::repositories::leaderboard_repository::LeaderboardRepository;
use crate::repositories::traits::CacheStore;
use async_trait::async_trait;

/// Postgres 缓存库，组合三个仓储
#[derive(Clone)]
pub struct PgCacheStore {
    games: GameRepository,
    donations: DonationRepository,
    leaderboard: LeaderboardRepository,
}

impl PgCacheStore {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            games: GameRepository::new(pool.clone()),
            donations: DonationRepository::new(pool.clone()),
            leaderboard: LeaderboardRepository::new(pool),
        }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn upsert_game(&self, row: &GameUpsert) -> Result<(), AppError> {
        self.games.upsert(row).await
    }

    async fn list_games(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<GameRecord>, AppError> {
        self.games.list(filter, start, limit).await
    }

    async fn insert_donation(&self, row: &DonationInsert) -> Result<(), AppError> {
        self.donations.insert(row).await
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>, AppError> {
        self.leaderboard.top(limit).await
    }
}
