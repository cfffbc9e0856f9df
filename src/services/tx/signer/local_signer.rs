// services/tx/signer/local_signer.rs

use crate::errors::error::AppError;
use crate::services::tx::signer::TxSigner;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{H160, Signature};
use ethers_signers::{LocalWallet, Signer};
use std::sync::Arc;

/// 服务端持有私钥的本地签名器
#[derive(Clone)]
pub struct LocalSigner {
    wallet: Arc<LocalWallet>,
}

impl LocalSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self {
            wallet: Arc::new(wallet),
        }
    }

    /// 私钥不合法时启动失败；错误信息不回显私钥内容
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self, AppError> {
        let key = private_key.trim().trim_start_matches("0x");
        let wallet = key
            .parse::<LocalWallet>()
            .map_err(|e| AppError::Config(format!("invalid signer private key: {}", e)))?
            .with_chain_id(chain_id);
        Ok(Self::new(wallet))
    }
}

#[async_trait::async_trait]
impl TxSigner for LocalSigner {
    async fn sign_tx(&self, tx: &TypedTransaction) -> Result<Signature, AppError> {
        self.wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| AppError::Internal(format!("Signing failed: {}", e)))
    }

    fn address(&self) -> H160 {
        self.wallet.address()
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.wallet.chain_id())
    }
}
