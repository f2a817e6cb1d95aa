//! Wallet adapter implementations (spec §4.5, §8 scenario 5).
//!
//! `MockWallet` is the deployment default (`wallet_mock_mode = true` in
//! `RuntimeConfig`) and never touches a real ledger: balances are tracked
//! in memory and every settlement mints a deterministic `MockTx_<uuid>`
//! signature that `verify` will always accept for its own recipient.

use aar_kernel::error::{AarError, AarResult};
use aar_kernel::payment::WalletAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

struct MockLedger {
    balance: f64,
    /// signature -> (recipient, amount)
    receipts: HashMap<String, (String, f64)>,
}

/// In-memory wallet used when `wallet_mock_mode` is enabled. Every `send`
/// mints a signature of the form `MockTx_<uuid>` and records it so a later
/// `verify` call for the same recipient and a sufficient amount succeeds.
pub struct MockWallet {
    address: String,
    ledger: Mutex<MockLedger>,
}

impl MockWallet {
    pub fn new(address: impl Into<String>, starting_balance: f64) -> Self {
        Self { address: address.into(), ledger: Mutex::new(MockLedger { balance: starting_balance, receipts: HashMap::new() }) }
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    async fn address(&self) -> String {
        self.address.clone()
    }

    async fn balance(&self) -> AarResult<f64> {
        Ok(self.ledger.lock().balance)
    }

    async fn send(&self, recipient: &str, amount: f64, _memo: Option<&str>) -> AarResult<String> {
        let mut ledger = self.ledger.lock();
        if amount <= 0.0 {
            return Err(AarError::Internal("payment amount must be positive".into()));
        }
        if ledger.balance < amount {
            return Err(AarError::Internal(format!("insufficient mock balance: have {}, need {amount}", ledger.balance)));
        }
        ledger.balance -= amount;
        let signature = format!("MockTx_{}", uuid::Uuid::new_v4());
        ledger.receipts.insert(signature.clone(), (recipient.to_string(), amount));
        Ok(signature)
    }

    async fn verify(&self, signature: &str, recipient: &str, min_amount: f64) -> AarResult<bool> {
        let ledger = self.ledger.lock();
        Ok(match ledger.receipts.get(signature) {
            Some((paid_to, amount)) => paid_to == recipient && *amount >= min_amount,
            None => false,
        })
    }
}
