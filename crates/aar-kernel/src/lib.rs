//! Core types and the error taxonomy shared by every Adaptive Agent
//! Runtime crate. Deliberately dependency-light: no transports, no I/O
//! beyond config loading, so this crate can be pulled in by test fixtures
//! without pulling in reqwest/axum.

pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod mode;
pub mod payment;
pub mod retry;
pub mod skill;
pub mod tool;
pub mod turn;
pub mod wire;

pub use config::RuntimeConfig;
pub use error::{AarError, AarResult};
pub use event::Event;
pub use llm::{FakeLlmProvider, LlmProvider, LlmRequest, LlmResponse};
pub use mode::{Mode, ModeManagerState, PlanPact};
pub use payment::{PaymentInvoice, TransactionReceipt, WalletAdapter};
pub use retry::{RetryConfig, RetryPolicy, retry_with_policy};
pub use skill::{SkillBundle, SkillFrontMatter};
pub use tool::{PaidSpec, ToolDescriptor, ToolSet, ToolSource};
pub use turn::{MessagePart, Session, SessionKey, Turn, ToolOutcome};
