use crate::database::diesel::AsyncDbPool;
use crate::errors::error::AppError;
use crate::models::db::game_db::{GameRecord, GameUpsert};
use crate::models::db::schema::games;
use crate::models::domain::game::StatusFilter;
use crate::repositories::base::RepositoryBase;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[derive(Clone)]
pub struct GameRepository {
    base: RepositoryBase,
}

impl GameRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            base: RepositoryBase::new(pool),
        }
    }

    /// 以 id 冲突做整行覆盖，重复执行结果不变
    pub async fn upsert(&self, row: &GameUpsert) -> Result<(), AppError> {
        let mut conn = self.base.get_connection().await?;
        diesel::insert_into(games::table)
            .values(row)
            .on_conflict(games::id)
            .do_update()
            .set(row)
            .execute(&mut *conn)
            .await
            .map_err(|e| self.base.map_diesel_error(e))?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<GameRecord>, AppError> {
        let mut conn = self.base.get_connection().await?;
        let mut query = games::table.select(GameRecord::as_select()).into_boxed();
        if let Some(statuses) = filter.statuses() {
            let names: Vec<&'static str> = statuses.iter().map(|s| s.as_str()).collect();
            query = query.filter(games::status.eq_any(names));
        }
        query
            .order(games::id.asc())
            .offset(start)
            .limit(limit)
            .load(&mut *conn)
            .await
            .map_err(|e| self.base.map_diesel_error(e))
    }
}
