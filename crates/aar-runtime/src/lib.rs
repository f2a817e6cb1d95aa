//! Adaptive Agent Runtime: the session loop, Mode Manager, Enforcer,
//! Payment Broker, and tool dispatch built atop `aar-kernel`'s data model
//! and `aar-foundation`'s transports.

pub mod core;
pub mod enforcer;
pub mod lease;
pub mod mode_manager;
pub mod payment_broker;
pub mod state;
pub mod tools;

pub use core::AdaptiveAgentCore;
pub use enforcer::EnforcerVerdict;
pub use lease::SessionLeaseRegistry;
pub use state::AgentState;
pub use tools::{DispatchEffect, RuntimeServices, SessionModeState, SkillLocalRegistry, SkillToolHandler};
