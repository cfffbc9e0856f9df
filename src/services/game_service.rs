// services/game_service.rs
use crate::errors::error::AppError;
use crate::infrastructure::contract::{ContractCall, ContractClient};
use crate::infrastructure::parser::EventParser;
use crate::models::db::game_db::GameRecord;
use crate::models::db::leaderboard_db::LeaderboardRow;
use crate::models::domain::event::EventKind;
use crate::models::domain::game::{GameDetails, StatusFilter};
use crate::repositories::traits::CacheStore;
use crate::services::game_sync::GameSync;
use crate::services::tx::types::TxResult;
use crate::utils::normalize_solution;
use crate::{log_info, log_warn};
use ethers_core::types::{Address, U64, U256};
use std::sync::Arc;

pub const LEADERBOARD_LIMIT: i64 = 100;

/// propose 的已校验参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposeParams {
    pub puzzle: String,
    pub solution_hash: [u8; 32],
    pub entry_fee: U256,
    pub token: Address,
    pub vote_threshold: U256,
    pub puzzle_type: u8,
    pub oracle_params: String,
}

#[derive(Debug, Clone)]
pub struct ProposeOutcome {
    pub tx: TxResult,
    pub game_id: Option<U256>,
}

/// 路由背后的业务入口：写操作先读链确认游戏存在，读列表走缓存
pub struct GameService {
    client: Arc<dyn ContractClient>,
    store: Arc<dyn CacheStore>,
    sync: GameSync,
    parser: EventParser,
}

impl GameService {
    pub fn new(client: Arc<dyn ContractClient>, store: Arc<dyn CacheStore>) -> Self {
        let parser = EventParser::new(client.contract_address());
        let sync = GameSync::new(client.clone(), store.clone());
        Self {
            client,
            store,
            sync,
            parser,
        }
    }

    pub async fn propose(&self, params: ProposeParams) -> Result<ProposeOutcome, AppError> {
        let call = ContractCall::ProposePuzzle {
            puzzle: params.puzzle,
            solution_hash: params.solution_hash,
            entry_fee: params.entry_fee,
            token: params.token,
            vote_threshold: params.vote_threshold,
            puzzle_type: params.puzzle_type,
            oracle_params: params.oracle_params,
        };
        let tx = self.client.send_contract_tx(call, None).await?;

        let game_id = self.parser.game_id_from_receipt(&tx.receipt);
        match game_id {
            Some(id) => {
                log_info!("Puzzle proposed: game {} tx {:#x}", id, tx.tx_hash);
                self.refresh(id).await;
            }
            None => log_warn!("No PuzzleProposed log in receipt {:#x}", tx.tx_hash),
        }
        Ok(ProposeOutcome { tx, game_id })
    }

    pub async fn vote(&self, game_id: U256, approve: bool) -> Result<TxResult, AppError> {
        self.client.get_existing_game(game_id).await?;
        self.client
            .send_contract_tx(ContractCall::VoteOnProposal { game_id, approve }, None)
            .await
    }

    /// 需要报名费时 value = entryFee
    pub async fn submit(&self, game_id: U256, solution: &str) -> Result<TxResult, AppError> {
        let solution = normalize_solution(solution);
        if solution.is_empty() {
            return Err(AppError::Validation("Invalid solution".into()));
        }
        let game = self.native_game(game_id, "submissions").await?;
        let value = game.require_submission_fee.then_some(game.entry_fee);
        self.client
            .send_contract_tx(ContractCall::SubmitSolution { game_id, solution }, value)
            .await
    }

    pub async fn challenge(&self, game_id: U256, reason: String) -> Result<TxResult, AppError> {
        self.native_game(game_id, "challenges").await?;
        let fee = self.client.get_challenge_fee().await?;
        self.client
            .send_contract_tx(ContractCall::ChallengeSolution { game_id, reason }, Some(fee))
            .await
    }

    pub async fn donate(&self, game_id: U256, amount: U256) -> Result<TxResult, AppError> {
        self.native_game(game_id, "donations").await?;
        self.client
            .send_contract_tx(ContractCall::DonateToGame { game_id, amount }, Some(amount))
            .await
    }

    pub async fn finalize(&self, game_id: U256) -> Result<TxResult, AppError> {
        self.client.get_existing_game(game_id).await?;
        let tx = self
            .client
            .send_contract_tx(ContractCall::FinalizeGame { game_id }, None)
            .await?;
        // 归档状态和赢家尽快反映到缓存
        self.refresh(game_id).await;
        Ok(tx)
    }

    pub async fn invalidate(&self, game_id: U256) -> Result<TxResult, AppError> {
        self.client.get_existing_game(game_id).await?;
        self.client
            .send_contract_tx(ContractCall::InvalidateGame { game_id }, None)
            .await
    }

    pub async fn reset(&self, game_id: U256) -> Result<TxResult, AppError> {
        self.client.get_existing_game(game_id).await?;
        self.client
            .send_contract_tx(ContractCall::ResetGame { game_id }, None)
            .await
    }

    /// 直接读链，不走缓存
    pub async fn get_game(&self, game_id: U256) -> Result<GameDetails, AppError> {
        self.client.get_existing_game(game_id).await
    }

    pub async fn default_fee(&self) -> Result<U256, AppError> {
        self.client.get_default_entry_fee().await
    }

    /// 缓存优先；缓存报错或该过滤条件下没有任何行时退回读链
    pub async fn list_game_ids(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<U256>, AppError> {
        match self.cached_ids(filter, start, limit).await {
            Ok(Some(ids)) => return Ok(ids),
            Ok(None) => {}
            Err(e) => log_warn!("Cache list failed, reading chain: {}", e),
        }
        self.chain_ids(filter, start, limit).await
    }

    /// None 表示缓存里没有该过滤条件的数据；翻页越界返回空页而不是读链
    async fn cached_ids(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Option<Vec<U256>>, AppError> {
        let rows = self.store.list_games(filter, start, limit).await?;
        if rows.is_empty() && (start <= 0 || self.store.list_games(filter, 0, 1).await?.is_empty()) {
            return Ok(None);
        }
        Ok(Some(rows.iter().map(|r| U256::from(r.id as u64)).collect()))
    }

    async fn chain_ids(&self, filter: StatusFilter, start: i64, limit: i64) -> Result<Vec<U256>, AppError> {
        let (start, limit) = (start.max(0) as usize, limit.max(0) as usize);
        if filter == StatusFilter::Active {
            return self
                .client
                .get_active_games(U256::from(start), U256::from(limit))
                .await;
        }

        let proposed = self.scan_proposed_ids().await?;
        if filter == StatusFilter::All {
            return Ok(proposed.into_iter().skip(start).take(limit).collect());
        }

        // 日志不带状态，逐个读链过滤
        let mut ids = Vec::new();
        let mut skipped = 0;
        for id in proposed {
            if ids.len() >= limit {
                break;
            }
            let game = self.client.get_game(id).await?;
            if !game.exists || !filter.matches(game.game_status().as_str()) {
                continue;
            }
            if skipped < start {
                skipped += 1;
                continue;
            }
            ids.push(id);
        }
        Ok(ids)
    }

    pub async fn list_cached_games(
        &self,
        filter: StatusFilter,
        start: i64,
        limit: i64,
    ) -> Result<Vec<GameRecord>, AppError> {
        self.store.list_games(filter, start, limit).await
    }

    pub async fn agents(&self) -> Result<Vec<LeaderboardRow>, AppError> {
        self.store.leaderboard(LEADERBOARD_LIMIT).await
    }

    /// 日志顺序即创建顺序
    async fn scan_proposed_ids(&self) -> Result<Vec<U256>, AppError> {
        let latest = self.client.get_block_number().await?;
        let logs = self
            .client
            .get_logs(&[EventKind::PuzzleProposed], U64::zero(), latest)
            .await?;
        Ok(logs
            .iter()
            .filter_map(|log| self.parser.proposed_game_id(log))
            .collect())
    }

    async fn native_game(&self, game_id: U256, flow: &str) -> Result<GameDetails, AppError> {
        let game = self.client.get_existing_game(game_id).await?;
        if !game.is_native_token() {
            return Err(AppError::Unsupported(format!(
                "ERC20 {} not supported by server wallet yet",
                flow
            )));
        }
        Ok(game)
    }

    /// 尽力刷新缓存，失败只记日志
    async fn refresh(&self, game_id: U256) {
        if let Err(e) = self.sync.upsert_game_row(game_id).await {
            log_warn!("Cache refresh for game {} failed: {}", game_id, e);
        }
    }
}
