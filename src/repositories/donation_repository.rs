use crate::database::diesel::AsyncDbPool;
use crate::errors::error::AppError;
use crate::models::db::donation_db::DonationInsert;
use crate::models::db::schema::game_donations;
use crate::repositories::base::RepositoryBase;
use diesel_async::RunQueryDsl;

#[derive(Clone)]
pub struct DonationRepository {
    base: RepositoryBase,
}

impl DonationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            base: RepositoryBase::new(pool),
        }
    }

    /// 只追加，不去重
    pub async fn insert(&self, row: &DonationInsert) -> Result<(), AppError> {
        let mut conn = self.base.get_connection().await?;
        diesel::insert_into(game_donations::table)
            .values(row)
            .execute(&mut *conn)
            .await
            .map_err(|e| self.base.map_diesel_error(e))?;
        Ok(())
    }
}
