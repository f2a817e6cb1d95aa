//! Tool Dispatch and the built-in tool catalog (spec §4.2, §4.9).

use std::collections::HashMap;
use std::sync::Arc;

use aar_foundation::{A2aClient, McpClient};
use aar_kernel::error::{AarError, AarResult};
use aar_kernel::mode::{Mode, ModeManagerState, PlanPact};
use aar_kernel::payment::WalletAdapter;
use aar_kernel::tool::{ToolDescriptor, ToolSet, ToolSource};
use aar_kernel::turn::ToolOutcome;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::payment_broker;

/// Per-session mutable state the Mode Manager and built-in tools act on.
/// Distinct from the append-only `Session` turn log, which lives in a
/// `SessionStore`.
pub struct SessionModeState {
    pub mode: Mode,
    pub plan_pact: PlanPact,
    pub mode_manager: ModeManagerState,
}

impl SessionModeState {
    pub fn new(mode: Mode, mode_manager: ModeManagerState) -> Self {
        Self { mode, plan_pact: PlanPact::default(), mode_manager }
    }
}

/// Side effect a built-in tool call has beyond its immediate result, applied
/// by the Adaptive Agent Core after dispatch (spec §4.9).
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEffect {
    None,
    /// `attempt_answer` / `ask_question`: the turn ends after this result.
    Terminal,
    /// The descriptor is `require_confirmation` and the call has not yet
    /// been confirmed: the Core suspends the turn until the host replies
    /// (spec §4.2, §6 confirmation protocol).
    AwaitingConfirmation,
}

/// An in-process handler bundled with a skill (spec §4.2 "skill-local").
#[async_trait]
pub trait SkillToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> AarResult<Value>;
}

/// Registry of skill-local handlers, keyed by tool name.
#[derive(Default, Clone)]
pub struct SkillLocalRegistry {
    handlers: HashMap<String, Arc<dyn SkillToolHandler>>,
}

impl SkillLocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn SkillToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SkillToolHandler>> {
        self.handlers.get(name)
    }
}

/// Transport and storage handles the dispatcher needs; shared process-wide.
pub struct RuntimeServices {
    pub wallet: Arc<dyn WalletAdapter>,
    pub mcp: Option<Arc<McpClient>>,
    pub a2a: Option<Arc<A2aClient>>,
    pub skill_locals: SkillLocalRegistry,
}

/// Builds the nine always-available built-in tool descriptors (spec §4.9).
pub fn builtin_tool_set() -> ToolSet {
    let mut set = ToolSet::new();
    set.extend([
        ToolDescriptor::builtin(
            "planner",
            "Record the plan for this stretch of conversation by naming every tool you intend to use.",
            json!({"type": "object", "properties": {"allowed_tools": {"type": "array", "items": {"type": "string"}}}, "required": ["allowed_tools"]}),
        ),
        ToolDescriptor::builtin(
            "switch_mode",
            "Request that the runtime reconfigure your instruction and tool set around a new focus.",
            json!({"type": "object", "properties": {"reason": {"type": "string"}, "new_focus": {"type": "string"}}, "required": ["reason"]}),
        ),
        ToolDescriptor::builtin(
            "ask_question",
            "End the turn by asking the user a clarifying question.",
            json!({"type": "object", "properties": {"question": {"type": "string"}}, "required": ["question"]}),
        ),
        ToolDescriptor::builtin(
            "attempt_answer",
            "End the turn with your final answer.",
            json!({"type": "object", "properties": {"answer": {"type": "string"}, "confidence": {"type": "string"}, "sources_used": {"type": "array", "items": {"type": "string"}}}, "required": ["answer"]}),
        ),
        ToolDescriptor::builtin("list_skills", "List the names of loaded skill bundles.", json!({"type": "object", "properties": {}})),
        ToolDescriptor::builtin(
            "enable_skill",
            "Add a loaded skill's tools and instructions to the active mode without a full mode switch.",
            json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}),
        ),
        ToolDescriptor::builtin(
            "system_retry",
            "Internal: the Enforcer's own retry vehicle.",
            json!({"type": "object", "properties": {"error_message": {"type": "string"}}, "required": ["error_message"]}),
        ),
        ToolDescriptor::builtin("check_balance", "Query the wallet adapter's current balance.", json!({"type": "object", "properties": {}})),
        ToolDescriptor::builtin(
            "send_payment",
            "Send a payment from the wallet adapter.",
            json!({"type": "object", "properties": {"recipient": {"type": "string"}, "amount": {"type": "number"}, "memo": {"type": "string"}}, "required": ["recipient", "amount"]}),
        ),
    ]);
    set
}

/// Resolves and invokes one tool call, returning its result and any
/// `DispatchEffect` the Core must apply afterward (spec §4.2).
pub async fn dispatch(name: &str, args: &Value, mode_state: &mut SessionModeState, services: &RuntimeServices, skills: &aar_foundation::SkillRegistry) -> (ToolOutcome, DispatchEffect) {
    let Some(descriptor) = mode_state.mode.active_tool_set.get(name).cloned() else {
        return (
            ToolOutcome::Error {
                tag: "ToolNotFound".to_string(),
                message: format!("tool '{name}' is not in the active tool set. Call `list_skills` to see available skills or `switch_mode` to reconfigure."),
            },
            DispatchEffect::None,
        );
    };

    let already_confirmed = args.get("confirmed").and_then(Value::as_bool).unwrap_or(false);
    if descriptor.require_confirmation && !already_confirmed {
        return (ToolOutcome::Ok { value: json!({ "awaiting_confirmation": true, "args": args }) }, DispatchEffect::AwaitingConfirmation);
    }

    if let Some(paid) = &descriptor.paid {
        match payment_broker::payment_hash(args) {
            None => {
                return (payment_broker::format_refusal(name, paid.price, &paid.currency, &paid.recipient, "payment required"), DispatchEffect::None);
            }
            Some(signature) => {
                if let Err(refusal) = payment_broker::verify_settlement(services.wallet.as_ref(), name, signature, paid.price, &paid.currency, &paid.recipient).await {
                    return (refusal, DispatchEffect::None);
                }
            }
        }
    }

    match descriptor.source {
        ToolSource::Builtin => dispatch_builtin(name, args, mode_state, services, skills).await,
        ToolSource::SkillLocal => match services.skill_locals.get(name) {
            Some(handler) => (outcome_from_result(handler.call(args.clone()).await), DispatchEffect::None),
            None => dispatch_mcp(name, args, services).await,
        },
        ToolSource::Mcp => dispatch_mcp(name, args, services).await,
        ToolSource::A2aPeer => dispatch_a2a(name, args, services).await,
    }
}

async fn dispatch_mcp(name: &str, args: &Value, services: &RuntimeServices) -> (ToolOutcome, DispatchEffect) {
    let Some(mcp) = &services.mcp else {
        return (ToolOutcome::Error { tag: "Transport".to_string(), message: "no MCP endpoint configured".to_string() }, DispatchEffect::None);
    };
    (outcome_from_result(mcp.call_tool(name, args.clone()).await), DispatchEffect::None)
}

async fn dispatch_a2a(name: &str, args: &Value, services: &RuntimeServices) -> (ToolOutcome, DispatchEffect) {
    let Some(a2a) = &services.a2a else {
        return (ToolOutcome::Error { tag: "Transport".to_string(), message: "no A2A peers configured".to_string() }, DispatchEffect::None);
    };
    let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
    let outcome = match a2a.forward(name, text).await {
        Ok(answer) => ToolOutcome::Ok { value: json!({ "answer": answer }) },
        Err(e) => ToolOutcome::Error { tag: e.tag().to_string(), message: e.to_string() },
    };
    (outcome, DispatchEffect::None)
}

fn outcome_from_result(result: AarResult<Value>) -> ToolOutcome {
    match result {
        Ok(value) => ToolOutcome::Ok { value },
        Err(e) => ToolOutcome::Error { tag: e.tag().to_string(), message: e.to_string() },
    }
}

async fn dispatch_builtin(name: &str, args: &Value, mode_state: &mut SessionModeState, services: &RuntimeServices, skills: &aar_foundation::SkillRegistry) -> (ToolOutcome, DispatchEffect) {
    match name {
        "planner" => {
            let tools: Vec<String> = args.get("allowed_tools").and_then(|v| v.as_array()).map(|arr| arr.iter().filter_map(|t| t.as_str().map(String::from)).collect()).unwrap_or_default();
            mode_state.plan_pact.set_plan(tools);
            (ToolOutcome::Ok { value: json!({ "active": true, "allowed_tools": mode_state.plan_pact.allowed_tool_names }) }, DispatchEffect::None)
        }
        "switch_mode" => {
            let focus = args.get("new_focus").and_then(|v| v.as_str()).map(String::from);
            mode_state.mode_manager.request_switch(focus);
            (ToolOutcome::Ok { value: json!({ "switch_requested": true }) }, DispatchEffect::None)
        }
        "ask_question" => {
            let question = args.get("question").and_then(|v| v.as_str()).unwrap_or_default();
            (ToolOutcome::Ok { value: json!({ "question": question }) }, DispatchEffect::Terminal)
        }
        "attempt_answer" => {
            let answer = args.get("answer").and_then(|v| v.as_str()).unwrap_or_default();
            (ToolOutcome::Ok { value: json!({ "answer": answer }) }, DispatchEffect::Terminal)
        }
        "list_skills" => (ToolOutcome::Ok { value: json!({ "skills": skills.names() }) }, DispatchEffect::None),
        "enable_skill" => {
            let skill_name = args.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            match skills.get(skill_name) {
                Some(bundle) => {
                    mode_state.mode.active_skills.push(bundle.name.clone());
                    mode_state.mode.instruction_text.push_str(&format!("\n\n{}", bundle.instructions_markdown));
                    (ToolOutcome::Ok { value: json!({ "enabled": bundle.name }) }, DispatchEffect::None)
                }
                None => (ToolOutcome::Error { tag: "ToolNotFound".to_string(), message: format!("no skill named '{skill_name}'") }, DispatchEffect::None),
            }
        }
        "system_retry" => {
            let error_message = args.get("error_message").and_then(|v| v.as_str()).unwrap_or_default();
            (ToolOutcome::Ok { value: json!({ "acknowledged": error_message }) }, DispatchEffect::None)
        }
        "check_balance" => match services.wallet.balance().await {
            Ok(balance) => (ToolOutcome::Ok { value: json!({ "balance": balance }) }, DispatchEffect::None),
            Err(e) => (ToolOutcome::Error { tag: e.tag().to_string(), message: e.to_string() }, DispatchEffect::None),
        },
        "send_payment" => {
            let recipient = args.get("recipient").and_then(|v| v.as_str()).unwrap_or_default();
            let amount = args.get("amount").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let memo = args.get("memo").and_then(|v| v.as_str());
            match services.wallet.send(recipient, amount, memo).await {
                Ok(signature) => (ToolOutcome::Ok { value: json!({ "signature": signature }) }, DispatchEffect::None),
                Err(e) => (ToolOutcome::Error { tag: e.tag().to_string(), message: e.to_string() }, DispatchEffect::None),
            }
        }
        other => (ToolOutcome::Error { tag: AarError::ToolNotFound(other.to_string()).tag().to_string(), message: format!("built-in tool '{other}' has no handler") }, DispatchEffect::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aar_foundation::{MockWallet, SkillRegistry};
    use aar_kernel::mode::{Mode, ModeManagerState};

    fn services() -> RuntimeServices {
        RuntimeServices { wallet: Arc::new(MockWallet::new("agent-wallet", 100.0)), mcp: None, a2a: None, skill_locals: SkillLocalRegistry::new() }
    }

    fn mode_state() -> SessionModeState {
        SessionModeState::new(Mode::initial(builtin_tool_set(), "be helpful"), ModeManagerState::new(1000, 0.5))
    }

    #[tokio::test]
    async fn planner_sets_plan_pact() {
        let mut state = mode_state();
        let (outcome, effect) = dispatch("planner", &json!({"allowed_tools": ["read_file"]}), &mut state, &services(), &SkillRegistry::empty()).await;
        assert!(matches!(outcome, ToolOutcome::Ok { .. }));
        assert_eq!(effect, DispatchEffect::None);
        assert!(state.plan_pact.active);
        assert!(state.plan_pact.permits("read_file"));
    }

    #[tokio::test]
    async fn attempt_answer_is_terminal() {
        let mut state = mode_state();
        let (_, effect) = dispatch("attempt_answer", &json!({"answer": "hi"}), &mut state, &services(), &SkillRegistry::empty()).await;
        assert_eq!(effect, DispatchEffect::Terminal);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let mut state = mode_state();
        let (outcome, _) = dispatch("nonexistent", &json!({}), &mut state, &services(), &SkillRegistry::empty()).await;
        match outcome {
            ToolOutcome::Error { tag, .. } => assert_eq!(tag, "ToolNotFound"),
            _ => panic!("expected ToolNotFound"),
        }
    }

    #[tokio::test]
    async fn paid_tool_without_hash_refuses() {
        let mut state = mode_state();
        state.mode.active_tool_set.insert(ToolDescriptor {
            paid: Some(aar_kernel::tool::PaidSpec { price: 10.0, currency: "SOL".into(), recipient: "vendor".into() }),
            ..ToolDescriptor::builtin("perform_premium_analysis", "premium analysis", json!({}))
        });
        let mut services = services();
        services.skill_locals.register("perform_premium_analysis", Arc::new(AlwaysOkHandler));

        let (outcome, _) = dispatch("perform_premium_analysis", &json!({"topic": "X"}), &mut state, &services, &SkillRegistry::empty()).await;
        match outcome {
            ToolOutcome::Error { tag, message } => {
                assert_eq!(tag, "PaymentRequired");
                assert!(message.contains("send_payment"));
            }
            _ => panic!("expected PaymentRequired refusal"),
        }
    }

    #[tokio::test]
    async fn paid_tool_with_verified_hash_succeeds() {
        let mut state = mode_state();
        let mut tool_set = builtin_tool_set();
        tool_set.insert(ToolDescriptor {
            source: ToolSource::SkillLocal,
            paid: Some(aar_kernel::tool::PaidSpec { price: 10.0, currency: "SOL".into(), recipient: "vendor".into() }),
            ..ToolDescriptor::builtin("perform_premium_analysis", "premium analysis", json!({}))
        });
        state.mode.active_tool_set = tool_set;

        let wallet = Arc::new(MockWallet::new("agent-wallet", 100.0));
        let signature = wallet.send("vendor", 10.0, None).await.unwrap();
        let mut services = RuntimeServices { wallet, mcp: None, a2a: None, skill_locals: SkillLocalRegistry::new() };
        services.skill_locals.register("perform_premium_analysis", Arc::new(AlwaysOkHandler));

        let (outcome, _) = dispatch("perform_premium_analysis", &json!({"topic": "X", "payment_hash": signature}), &mut state, &services, &SkillRegistry::empty()).await;
        assert!(matches!(outcome, ToolOutcome::Ok { .. }));
    }

    #[tokio::test]
    async fn confirmation_required_tool_suspends_until_confirmed() {
        let mut state = mode_state();
        state.mode.active_tool_set.insert(ToolDescriptor { require_confirmation: true, ..ToolDescriptor::builtin("send_payment", "send a payment", json!({})) });

        let (outcome, effect) = dispatch("send_payment", &json!({"recipient": "vendor", "amount": 5.0}), &mut state, &services(), &SkillRegistry::empty()).await;
        assert_eq!(effect, DispatchEffect::AwaitingConfirmation);
        assert!(matches!(outcome, ToolOutcome::Ok { value } if value["awaiting_confirmation"] == true));

        let (outcome, effect) = dispatch("send_payment", &json!({"recipient": "vendor", "amount": 5.0, "confirmed": true}), &mut state, &services(), &SkillRegistry::empty()).await;
        assert_eq!(effect, DispatchEffect::None);
        assert!(matches!(outcome, ToolOutcome::Ok { .. }));
    }

    struct AlwaysOkHandler;

    #[async_trait]
    impl SkillToolHandler for AlwaysOkHandler {
        async fn call(&self, _args: Value) -> AarResult<Value> {
            Ok(json!({ "report": "ok" }))
        }
    }
}
