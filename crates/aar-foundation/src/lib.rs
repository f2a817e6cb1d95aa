//! Transport clients and storage backends surrounding the Adaptive Agent
//! Core: MCP tool servers, A2A peers, the skill registry, session
//! persistence, and wallet adapters.

pub mod a2a;
pub mod mcp;
pub mod session_store;
pub mod skills;
pub mod wallet;

pub use a2a::{A2aClient, A2aPeer, A2aPeersFile, AgentCard, PeerConfig};
pub use mcp::McpClient;
pub use session_store::{FileStore, InMemoryStore, SessionStore};
pub use skills::SkillRegistry;
pub use wallet::MockWallet;
