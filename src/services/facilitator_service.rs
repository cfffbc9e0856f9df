// services/facilitator_service.rs
use serde::Serialize;
use serde_json::Value;

pub const X402_VERSION: u8 = 1;
pub const EXACT_SCHEME: &str = "exact";
/// Sei 主网 chain id，其余按测试网处理
pub const SEI_MAINNET_CHAIN_ID: u64 = 1329;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedKind {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedKinds {
    pub kinds: Vec<SupportedKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}

/// x402 支付校验；只做 verify，不做结算
pub trait PaymentFacilitator: Send + Sync {
    fn supported(&self) -> SupportedKinds;
    fn verify(&self, payload: &Value, requirements: &Value) -> VerifyResult;
}

#[derive(Debug, Clone)]
pub struct X402Facilitator {
    network: String,
}

impl X402Facilitator {
    pub fn new(chain_id: u64) -> Self {
        Self {
            network: network_for_chain(chain_id).to_string(),
        }
    }
}

pub fn network_for_chain(chain_id: u64) -> &'static str {
    if chain_id == SEI_MAINNET_CHAIN_ID {
        "sei"
    } else {
        "sei-testnet"
    }
}

/// payer 可能在顶层，也可能在 EIP-3009 authorization.from 里
fn payer_of(payload: &Value) -> Option<String> {
    payload
        .get("payer")
        .or_else(|| payload.pointer("/payload/authorization/from"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl PaymentFacilitator for X402Facilitator {
    fn supported(&self) -> SupportedKinds {
        SupportedKinds {
            kinds: vec![SupportedKind {
                x402_version: X402_VERSION,
                scheme: EXACT_SCHEME.to_string(),
                network: self.network.clone(),
            }],
        }
    }

    fn verify(&self, payload: &Value, requirements: &Value) -> VerifyResult {
        let payer = payer_of(payload);
        let network = requirements.get("network").and_then(Value::as_str);
        let scheme = requirements.get("scheme").and_then(Value::as_str);

        let invalid_reason = match (network, scheme) {
            (Some(n), _) if n != self.network => Some("unsupported_network"),
            (None, _) => Some("missing_network"),
            (_, Some(s)) if s != EXACT_SCHEME => Some("unsupported_scheme"),
            _ => None,
        };

        VerifyResult {
            is_valid: invalid_reason.is_none(),
            payer,
            invalid_reason: invalid_reason.map(str::to_string),
        }
    }
}
