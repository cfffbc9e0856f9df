pub mod facilitator_service;
pub mod game_service;
pub mod game_sync;
pub mod indexer_service;
pub mod tx;
pub mod tx_service;
