// services/game_sync.rs
use crate::errors::error::AppError;
use crate::infrastructure::contract::ContractClient;
use crate::log_debug;
use crate::models::db::donation_db::DonationInsert;
use crate::models::db::game_db::GameUpsert;
use crate::models::domain::event::DonationReceivedEvent;
use crate::repositories::traits::CacheStore;
use crate::utils::u256_to_i64;
use ethers_core::types::U256;
use std::sync::Arc;

/// 链上状态 → 缓存行。事件只作为触发信号，内容一律重新从合约读
#[derive(Clone)]
pub struct GameSync {
    client: Arc<dyn ContractClient>,
    store: Arc<dyn CacheStore>,
}

impl GameSync {
    pub fn new(client: Arc<dyn ContractClient>, store: Arc<dyn CacheStore>) -> Self {
        Self { client, store }
    }

    /// 合约报告不存在的游戏不写入，返回 None
    pub async fn upsert_game_row(&self, id: U256) -> Result<Option<GameUpsert>, AppError> {
        let row_id = u256_to_i64(id)?;
        let details = self.client.get_game(id).await?;
        if !details.exists {
            log_debug!("Game {} does not exist on chain, skip upsert", id);
            return Ok(None);
        }

        let row = GameUpsert::from_details(row_id, &details)?;
        self.store.upsert_game(&row).await?;
        Ok(Some(row))
    }

    pub async fn record_donation(&self, event: &DonationReceivedEvent) -> Result<(), AppError> {
        let row = DonationInsert::try_from(event)?;
        self.store.insert_donation(&row).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChain, MemoryStore, native_game};
    use ethers_core::types::Address;

    fn setup() -> (Arc<FakeChain>, Arc<MemoryStore>, GameSync) {
        let chain = Arc::new(FakeChain::new());
        let store = Arc::new(MemoryStore::default());
        let sync = GameSync::new(chain.clone(), store.clone());
        (chain, store, sync)
    }

    #[tokio::test]
    async fn upsert_twice_without_chain_change_is_identical() {
        let (chain, store, sync) = setup();
        chain.insert_game(4, native_game("riddle"));

        sync.upsert_game_row(U256::from(4u64)).await.unwrap();
        let first = store.row(4).unwrap();
        sync.upsert_game_row(U256::from(4u64)).await.unwrap();
        let second = store.row(4).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.games.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_follows_chain_changes() {
        let (chain, store, sync) = setup();
        chain.insert_game(1, native_game("riddle"));
        sync.upsert_game_row(U256::one()).await.unwrap();
        chain.set_status(1, 4);
        sync.upsert_game_row(U256::one()).await.unwrap();
        assert_eq!(store.row(1).unwrap().status, "solved");
    }

    #[tokio::test]
    async fn missing_game_is_not_cached() {
        let (_chain, store, sync) = setup();
        assert!(sync.upsert_game_row(U256::from(9u64)).await.unwrap().is_none());
        assert!(store.row(9).is_none());
    }

    #[tokio::test]
    async fn oversized_id_is_rejected() {
        let (_chain, _store, sync) = setup();
        let id = U256::from(i64::MAX as u64) + 1;
        assert!(matches!(
            sync.upsert_game_row(id).await,
            Err(AppError::Conversion(_))
        ));
    }

    #[tokio::test]
    async fn donation_is_appended() {
        let (_chain, store, sync) = setup();
        let event = DonationReceivedEvent {
            game_id: U256::from(2u64),
            donor: Address::repeat_byte(0x0d),
            amount: U256::from(500u64),
        };
        sync.record_donation(&event).await.unwrap();
        sync.record_donation(&event).await.unwrap();
        let donations = store.donations.lock().unwrap();
        assert_eq!(donations.len(), 2);
        assert_eq!(donations[0].game_id, 2);
        assert_eq!(donations[0].token_address, None);
    }
}
