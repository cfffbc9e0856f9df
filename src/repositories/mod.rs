pub mod base;
pub mod donation_repository;
pub mod game_repository;
pub mod leaderboard_repository;
pub mod pg_cache_store;
pub mod traits;

pub use pg_cache_store::PgCacheStore;
pub use traits::CacheStore;
