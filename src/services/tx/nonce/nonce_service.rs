// services/tx/nonce/nonce_service.rs

use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::{log_debug, log_info, log_warn};
use ethers_core::types::H160;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

// 启动时创建一次，注入到 TxService，所有请求共享同一个实例
pub struct NonceService {
    address: H160,
    /// 本地维护的下一个可用 nonce（原子操作，适合并发预占）
    current_nonce: AtomicU64,
    /// 已预占、尚未广播完成或归还的 nonce 数
    in_flight: AtomicU64,
    /// 有预占未结束时无法回退，等最后一个结束后再对齐链上
    resync_pending: AtomicBool,
    /// 防止并发同步链上 nonce 时冲突
    sync_lock: Mutex<()>,
}

impl NonceService {
    /// 从链上 pending nonce 初始化
    pub async fn new(provider: &dyn ProviderTrait, address: H160) -> Result<Self, AppError> {
        let chain_nonce = provider.get_transaction_count(address).await?;
        log_info!("Signer {:#x} starting nonce {}", address, chain_nonce);

        Ok(Self::with_nonce(address, chain_nonce.as_u64()))
    }

    pub fn with_nonce(address: H160, nonce: u64) -> Self {
        Self {
            address,
            current_nonce: AtomicU64::new(nonce),
            in_flight: AtomicU64::new(0),
            resync_pending: AtomicBool::new(false),
            sync_lock: Mutex::new(()),
        }
    }

    /// 预占一个 nonce，用完必须调用 settle 或 release
    pub fn acquire(&self) -> u64 {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.current_nonce.fetch_add(1, Ordering::SeqCst)
    }

    /// 广播结束（成功或失败）；返回 true 表示这是最后一个预占且有待执行的对齐
    pub fn settle(&self) -> bool {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.take_deferred_resync()
    }

    /// 没有预占在途且之前有被推迟的对齐
    pub fn take_deferred_resync(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
            && self.resync_pending.swap(false, Ordering::SeqCst)
    }

    /// 广播前失败时归还 nonce；只有它仍是最后一个预占值时才能回退，否则返回 false
    pub fn release(&self, nonce: u64) -> bool {
        let rewound = self
            .current_nonce
            .compare_exchange(nonce + 1, nonce, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        rewound
    }

    /// 与链上 pending nonce 对齐。前进总是安全的；
    /// 回退只在没有其他预占时进行，否则会把别人手里的 nonce 再发一次
    pub async fn resync(&self, provider: &dyn ProviderTrait) -> Result<(), AppError> {
        let _guard = self.sync_lock.lock().await;

        let chain_nonce = provider.get_transaction_count(self.address).await?.as_u64();
        // 先读 current 再读 in_flight，CAS 失败说明期间有新的预占
        let local = self.current_nonce.load(Ordering::SeqCst);
        if chain_nonce == local {
            return Ok(());
        }
        if chain_nonce > local {
            self.current_nonce.fetch_max(chain_nonce, Ordering::SeqCst);
        } else if self.in_flight.load(Ordering::SeqCst) > 0
            || self
                .current_nonce
                .compare_exchange(local, chain_nonce, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            self.resync_pending.store(true, Ordering::SeqCst);
            log_debug!(
                "Nonce rewind for {:#x} deferred: local {}, chain {}",
                self.address,
                local,
                chain_nonce
            );
            return Ok(());
        }
        log_warn!(
            "Nonce resynced for {:#x}: local {} -> chain {}",
            self.address,
            local,
            chain_nonce
        );
        Ok(())
    }

    pub fn current(&self) -> u64 {
        self.current_nonce.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethers_core::types::transaction::eip2718::TypedTransaction;
    use ethers_core::types::{Bytes, Filter, Log, TransactionReceipt, U64, U256};

    /// 只回答 pending nonce 的链
    struct PendingCount(u64);

    #[async_trait]
    impl ProviderTrait for PendingCount {
        async fn get_last_block_number(&self) -> Result<U64, AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn get_chain_id(&self) -> Result<U256, AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn get_transaction_count(&self, _address: H160) -> Result<U256, AppError> {
            Ok(U256::from(self.0))
        }
        async fn estimate_eip1559_fees(&self) -> Result<(U256, U256), AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn send_raw_transaction(
            &self,
            _rlp: Bytes,
            _timeout_secs: u64,
            _confirmations: usize,
        ) -> Result<TransactionReceipt, AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn call(&self, _tx: &TypedTransaction) -> Result<Bytes, AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256, AppError> {
            Err(AppError::Internal("unused".into()))
        }
        async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, AppError> {
            Err(AppError::Internal("unused".into()))
        }
    }

    #[tokio::test]
    async fn resync_never_rewinds_under_outstanding_reservation() {
        let svc = NonceService::with_nonce(H160::zero(), 5);
        let a = svc.acquire();
        let b = svc.acquire();
        assert_eq!((a, b), (5, 6));

        // a 在广播前失败，b 仍在途
        assert!(!svc.release(a));
        svc.resync(&PendingCount(5)).await.unwrap();
        assert_eq!(svc.current(), 7);
        let c = svc.acquire();
        assert_ne!(c, b);
        assert_eq!(c, 7);

        // 最后一个在途结束后才执行被推迟的回退
        assert!(!svc.settle());
        assert!(svc.settle());
        svc.resync(&PendingCount(5)).await.unwrap();
        assert_eq!(svc.current(), 5);
    }

    #[tokio::test]
    async fn resync_moves_forward_even_with_reservations() {
        let svc = NonceService::with_nonce(H160::zero(), 3);
        svc.acquire();
        svc.resync(&PendingCount(10)).await.unwrap();
        assert_eq!(svc.current(), 10);
        assert!(!svc.settle());
    }

    #[tokio::test]
    async fn idle_resync_follows_chain() {
        let svc = NonceService::with_nonce(H160::zero(), 8);
        let n = svc.acquire();
        assert!(!svc.settle());
        svc.resync(&PendingCount(n)).await.unwrap();
        assert_eq!(svc.current(), 8);
    }

    #[test]
    fn acquire_hands_out_sequential_nonces() {
        let svc = NonceService::with_nonce(H160::zero(), 7);
        assert_eq!(svc.acquire(), 7);
        assert_eq!(svc.acquire(), 8);
        assert_eq!(svc.current(), 9);
    }

    #[test]
    fn release_only_rewinds_latest_reservation() {
        let svc = NonceService::with_nonce(H160::zero(), 0);
        let first = svc.acquire();
        let second = svc.acquire();
        // first 已不是最后一个，不能回退
        assert!(!svc.release(first));
        assert!(svc.release(second));
        assert_eq!(svc.current(), 1);
    }
}
