//! Payment Broker (spec §4.5).
//!
//! Resolved against `original_source/agent/dak_agent/handlers/payment_handler.py`
//! and `wallet_manager.py`: the refusal body is a fixed markdown template
//! naming the amount, recipient, the exact `send_payment` call shape, and
//! the `payment_hash` retry instruction.

use aar_kernel::error::AarError;
use aar_kernel::payment::WalletAdapter;
use aar_kernel::turn::ToolOutcome;
use serde_json::Value;

/// Formats a `PaymentRequired` condition into the structured `ToolResult`
/// body the model sees. Never auto-pays — the only way forward is the
/// model calling `send_payment` itself.
pub fn format_refusal(tool_name: &str, price: f64, currency: &str, recipient: &str, reason: &str) -> ToolOutcome {
    let message = format!(
        "Payment Required: '{tool_name}' costs {price} {currency}, payable to '{recipient}' ({reason}).\n\
         To proceed, call `send_payment(recipient=\"{recipient}\", amount={price})`, then retry \
         `{tool_name}` with the returned signature as `payment_hash`."
    );
    ToolOutcome::Error { tag: "PaymentRequired".to_string(), message }
}

/// Extracts `payment_hash` from tool call arguments, if present.
pub fn payment_hash(args: &Value) -> Option<&str> {
    args.get("payment_hash").and_then(|v| v.as_str())
}

/// Verifies a previously-presented `payment_hash` against the invoice's
/// recipient and minimum amount. Returns `Ok(())` when the wallet confirms
/// settlement, or the `PaymentRequired` refusal to surface to the model
/// otherwise (spec §4.5 step 3: "an unverified hash yields another
/// PaymentRequired with reason 'verification failed'").
pub async fn verify_settlement(wallet: &dyn WalletAdapter, tool_name: &str, signature: &str, price: f64, currency: &str, recipient: &str) -> Result<(), ToolOutcome> {
    let verified = wallet.verify(signature, recipient, price).await;
    match verified {
        Ok(true) => Ok(()),
        Ok(false) => Err(format_refusal(tool_name, price, currency, recipient, "verification failed")),
        Err(AarError::Transport(msg)) => Err(ToolOutcome::Error { tag: "Transport".to_string(), message: msg }),
        Err(other) => Err(ToolOutcome::Error { tag: other.tag().to_string(), message: other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aar_foundation::MockWallet;

    #[test]
    fn refusal_names_amount_recipient_and_retry_shape() {
        let outcome = format_refusal("perform_premium_analysis", 10.0, "SOL", "vendor-wallet", "premium analysis tier");
        match outcome {
            ToolOutcome::Error { tag, message } => {
                assert_eq!(tag, "PaymentRequired");
                assert!(message.contains("10") && message.contains("SOL") && message.contains("vendor-wallet"));
                assert!(message.contains("send_payment"));
                assert!(message.contains("payment_hash"));
            }
            _ => panic!("expected an error outcome"),
        }
    }

    #[tokio::test]
    async fn settlement_verifies_against_wallet() {
        let wallet = MockWallet::new("agent-wallet", 100.0);
        let signature = wallet.send("vendor-wallet", 10.0, None).await.unwrap();

        assert!(verify_settlement(&wallet, "perform_premium_analysis", &signature, 10.0, "SOL", "vendor-wallet").await.is_ok());
    }

    #[tokio::test]
    async fn unverified_hash_yields_verification_failed() {
        let wallet = MockWallet::new("agent-wallet", 100.0);
        let result = verify_settlement(&wallet, "perform_premium_analysis", "MockTx_bogus", 10.0, "SOL", "vendor-wallet").await;
        match result {
            Err(ToolOutcome::Error { tag, message }) => {
                assert_eq!(tag, "PaymentRequired");
                assert!(message.contains("verification failed"));
            }
            _ => panic!("expected a verification failure"),
        }
    }

    #[test]
    fn payment_hash_extracted_from_args() {
        let args = serde_json::json!({ "payment_hash": "MockTx_abc" });
        assert_eq!(payment_hash(&args), Some("MockTx_abc"));
        assert_eq!(payment_hash(&serde_json::json!({})), None);
    }
}
