//! Payment types consumed by the Payment Broker (spec §3, §4.5).

use serde::{Deserialize, Serialize};

/// Produced by a tool implementation; consumed by the Payment Broker;
/// never persisted to the session (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInvoice {
    pub tool_name: String,
    pub price: f64,
    pub currency: String,
    pub recipient: String,
    pub reason: String,
}

/// Owned by the Wallet Adapter; passed as an opaque token back to the paid
/// tool on retry (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub signature: String,
    pub recipient: String,
    pub amount: f64,
    pub confirmed: bool,
}

/// Capability-typed wallet interface (spec §4.5).
#[async_trait::async_trait]
pub trait WalletAdapter: Send + Sync {
    async fn address(&self) -> String;
    async fn balance(&self) -> crate::error::AarResult<f64>;
    async fn send(&self, recipient: &str, amount: f64, memo: Option<&str>) -> crate::error::AarResult<String>;
    async fn verify(&self, signature: &str, recipient: &str, min_amount: f64) -> crate::error::AarResult<bool>;
}
