// services/indexer_service.rs
use crate::config::IndexerConfig;
use crate::errors::error::AppError;
use crate::infrastructure::contract::ContractClient;
use crate::infrastructure::parser::EventParser;
use crate::models::domain::event::{ContractEvent, EventKind};
use crate::services::game_sync::GameSync;
use crate::{log_debug, log_error, log_info, log_warn};
use ethers_core::types::{Log, U64, U256};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// 实时监听的事件
const WATCHED_EVENTS: [EventKind; 2] = [EventKind::PuzzleProposed, EventKind::DonationReceived];

/// 缓存镜像索引器：启动回填 + 轮询事件 + 定时对账
pub struct IndexerService {
    client: Arc<dyn ContractClient>,
    sync: GameSync,
    parser: EventParser,
    config: IndexerConfig,
    // 只做短暂的插入/快照，不跨 await 持有
    tracked: Mutex<HashSet<U256>>,
}

/// start 返回的句柄，shutdown 停止所有后台任务
pub struct IndexerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl IndexerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                log_error!("Indexer task ended abnormally: {}", e);
            }
        }
        log_info!("Indexer stopped");
    }
}

impl IndexerService {
    pub fn new(client: Arc<dyn ContractClient>, sync: GameSync, config: IndexerConfig) -> Self {
        let parser = EventParser::new(client.contract_address());
        Self {
            client,
            sync,
            parser,
            config,
            tracked: Mutex::new(HashSet::new()),
        }
    }

    pub fn track(&self, id: U256) {
        if let Ok(mut tracked) = self.tracked.lock() {
            tracked.insert(id);
        }
    }

    pub fn tracked_ids(&self) -> Vec<U256> {
        let mut ids: Vec<U256> = self
            .tracked
            .lock()
            .map(|tracked| tracked.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// 历史 PuzzleProposed 全量回填，返回下一轮轮询的起始区块
    pub async fn backfill_from_logs(&self) -> Result<U64, AppError> {
        let latest = self.client.get_block_number().await?;
        let logs = self
            .client
            .get_logs(&[EventKind::PuzzleProposed], U64::zero(), latest)
            .await?;
        log_info!("Backfill: {} PuzzleProposed logs up to block {}", logs.len(), latest);

        let mut upserted = 0usize;
        for log in &logs {
            let Some(id) = self.parser.proposed_game_id(log) else {
                log_warn!("Backfill: cannot read gameId from log {:?}", log.transaction_hash);
                continue;
            };
            if id > U256::from(i64::MAX as u64) {
                log_warn!("Backfill: gameId {} exceeds BIGINT range, skipped", id);
                continue;
            }
            // id 0 可能是解码退化的结果，读链确认
            if id.is_zero() {
                match self.client.get_game(id).await {
                    Ok(game) if game.exists => {}
                    Ok(_) => continue,
                    Err(e) => {
                        log_warn!("Backfill: verifying game 0 failed: {}", e);
                        continue;
                    }
                }
            }
            self.track(id);
            if self.upsert(id).await {
                upserted += 1;
            }
        }
        log_info!("Backfill by logs finished: {} games upserted", upserted);
        Ok(latest + 1)
    }

    /// getActiveGames(0, limit) 的结果全部跟踪并写入
    pub async fn backfill_active_games(&self) -> Result<usize, AppError> {
        let ids = self
            .client
            .get_active_games(U256::zero(), U256::from(self.config.active_seed_limit))
            .await?;
        for id in &ids {
            self.track(*id);
            self.upsert(*id).await;
        }
        log_info!("Seeded {} active games", ids.len());
        Ok(ids.len())
    }

    /// 处理 [cursor, latest] 内的新事件，返回新的 cursor
    pub async fn poll_events_once(&self, cursor: U64) -> Result<U64, AppError> {
        let latest = self.client.get_block_number().await?;
        if latest < cursor {
            return Ok(cursor);
        }
        let logs = self.client.get_logs(&WATCHED_EVENTS, cursor, latest).await?;
        for log in &logs {
            self.handle_log(log).await;
        }
        if !logs.is_empty() {
            log_debug!("Processed {} logs in blocks {}..={}", logs.len(), cursor, latest);
        }
        Ok(latest + 1)
    }

    /// 对所有已跟踪 id 重新读链写缓存
    pub async fn reconcile_once(&self) -> usize {
        let ids = self.tracked_ids();
        let mut refreshed = 0usize;
        for id in ids {
            if self.upsert(id).await {
                refreshed += 1;
            }
        }
        refreshed
    }

    /// 回填后启动轮询和对账两个后台任务
    pub fn start(self: Arc<Self>) -> IndexerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let watcher = {
            let indexer = self.clone();
            let rx = shutdown_rx.clone();
            tokio::spawn(async move { indexer.run_watcher(rx).await })
        };
        let reconciler = {
            let indexer = self.clone();
            tokio::spawn(async move { indexer.run_reconciler(shutdown_rx).await })
        };

        IndexerHandle {
            shutdown_tx,
            tasks: vec![watcher, reconciler],
        }
    }

    async fn run_watcher(&self, mut shutdown: watch::Receiver<bool>) {
        log_info!("Indexer starting watchers");
        let mut cursor = match self.backfill_from_logs().await {
            Ok(next) => Some(next),
            Err(e) => {
                log_error!("Backfill by logs failed: {}", e);
                None
            }
        };
        if let Err(e) = self.backfill_active_games().await {
            log_warn!("Initial active-game seed failed: {}", e);
        }

        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    cursor = self.poll_tick(cursor).await;
                }
            }
        }
    }

    async fn poll_tick(&self, cursor: Option<U64>) -> Option<U64> {
        // 回填失败时从当前区块开始监听
        let from = match cursor {
            Some(c) => c,
            None => match self.client.get_block_number().await {
                Ok(latest) => return Some(latest + 1),
                Err(e) => {
                    log_warn!("Watcher cannot read block number: {}", e);
                    return None;
                }
            },
        };
        match self.poll_events_once(from).await {
            Ok(next) => Some(next),
            Err(e) => {
                log_warn!("Event poll failed: {}", e);
                Some(from)
            }
        }
    }

    async fn run_reconciler(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(self.config.reconcile_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一个 tick 立即触发，跳过
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let refreshed = self.reconcile_once().await;
                    log_debug!("Reconciliation refreshed {} games", refreshed);
                }
            }
        }
    }

    async fn handle_log(&self, log: &Log) {
        let event = match self.parser.decode(log) {
            Ok(event) => event,
            Err(e) => {
                // PuzzleProposed 仍可从 topic 取 id
                if let Some(id) = self.parser.proposed_game_id(log) {
                    self.track(id);
                    self.upsert(id).await;
                } else {
                    log_warn!("Skipping undecodable log: {}", e);
                }
                return;
            }
        };

        match event {
            ContractEvent::PuzzleProposed(e) => {
                self.track(e.game_id);
                if self.upsert(e.game_id).await {
                    log_info!("PuzzleProposed upserted game {}", e.game_id);
                }
            }
            ContractEvent::DonationReceived(e) => {
                if let Err(err) = self.sync.record_donation(&e).await {
                    log_error!("Recording donation for game {} failed: {}", e.game_id, err);
                }
                self.upsert(e.game_id).await;
                self.track(e.game_id);
                log_info!("Donation recorded for game {} amount {}", e.game_id, e.amount);
            }
            other => {
                // 其他事件不在监听范围内，只刷新对应游戏
                self.track(other.game_id());
                self.upsert(other.game_id()).await;
            }
        }
    }

    async fn upsert(&self, id: U256) -> bool {
        match self.sync.upsert_game_row(id).await {
            Ok(row) => row.is_some(),
            Err(e) => {
                log_error!("Upsert of game {} failed: {}", id, e);
                false
            }
        }
    }
}
