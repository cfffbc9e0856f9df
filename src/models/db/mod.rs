pub mod donation_db;
pub mod game_db;
pub mod leaderboard_db;
pub mod schema;
