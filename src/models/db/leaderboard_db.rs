use crate::models::db::schema::leaderboard;
use bigdecimal::BigDecimal;
use diesel::{Queryable, Selectable};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = leaderboard)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LeaderboardRow {
    pub address: String,
    pub wins: i64,
    pub total_donated: BigDecimal,
}
