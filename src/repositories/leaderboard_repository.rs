use crate::database::diesel::AsyncDbPool;
use crate::errors::error::AppError;
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::db::schema::leaderboard;
use crate::repositories::base::RepositoryBase;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Clone)]
pub struct LeaderboardRepository {
    base: RepositoryBase,
}

impl LeaderboardRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            base: RepositoryBase::new(pool),
        }
    }

    pub async fn top(&self, limit: i64) -> Result<Vec<LeaderboardRow>, AppError> {
        let mut conn = self.base.get_connection().await?;
        leaderboard::table
            .select(LeaderboardRow::as_select())
            .order((leaderboard::wins.desc(), leaderboard::total_donated.desc()))
            .limit(limit)
            .load(&mut *conn)
            .await
            .map_err(|e| self.base.map_diesel_error(e))
    }
}
