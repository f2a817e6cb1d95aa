//! Adaptive Agent Core: the session loop (spec §4.1).

use std::sync::Arc;

use aar_foundation::{SessionStore, SkillRegistry};
use aar_kernel::error::{AarError, AarResult};
use aar_kernel::event::Event;
use aar_kernel::llm::{LlmProvider, LlmRequest};
use aar_kernel::mode::{Mode, ModeManagerState};
use aar_kernel::retry::{RetryConfig, retry_with_policy};
use aar_kernel::tool::ToolDescriptor;
use aar_kernel::turn::{MessagePart, SessionKey, Turn};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Mutex as AsyncMutex;
use tracing::Instrument;

use crate::enforcer::{self, EnforcerVerdict};
use crate::lease::SessionLeaseRegistry;
use crate::mode_manager;
use crate::tools::{self, DispatchEffect, RuntimeServices, SessionModeState};

/// Ties together the session store, transports, and the per-session mode
/// state that isn't part of the durable turn log. The Mode for a session
/// is guarded by a per-session `tokio::sync::Mutex` (spec §5: "the Mode
/// (one per session) is guarded by a per-session mutex"), chosen over a
/// sync mutex because tool dispatch holds it across `.await` points.
pub struct AdaptiveAgentCore {
    pub config: aar_kernel::config::RuntimeConfig,
    pub store: Arc<dyn SessionStore>,
    pub skills: Arc<SkillRegistry>,
    pub services: Arc<RuntimeServices>,
    pub llm: Arc<dyn LlmProvider>,
    pub meta_llm: Arc<dyn LlmProvider>,
    pub leases: SessionLeaseRegistry,
    mode_states: DashMap<String, Arc<AsyncMutex<SessionModeState>>>,
}

impl AdaptiveAgentCore {
    pub fn new(config: aar_kernel::config::RuntimeConfig, store: Arc<dyn SessionStore>, skills: Arc<SkillRegistry>, services: Arc<RuntimeServices>, llm: Arc<dyn LlmProvider>, meta_llm: Arc<dyn LlmProvider>) -> Self {
        Self { config, store, skills, services, llm, meta_llm, leases: SessionLeaseRegistry::new(), mode_states: DashMap::new() }
    }

    fn initial_mode(&self) -> Mode {
        Mode::initial(tools::builtin_tool_set(), "You are a helpful assistant. Always respond by calling exactly one tool.")
    }

    /// The live per-session mode state, created on first access. Exposed so
    /// callers (and tests, including `aar-gateway`'s) can install a
    /// `require_confirmation` descriptor or otherwise adjust a session's
    /// active tool set ahead of a turn.
    pub fn mode_state_handle(&self, storage_id: &str) -> Arc<AsyncMutex<SessionModeState>> {
        self.mode_states
            .entry(storage_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(SessionModeState::new(self.initial_mode(), ModeManagerState::new(self.config.max_context_tokens_for(&self.config.meta_model_id), self.config.context_threshold)))))
            .clone()
    }

    /// Runs one user turn to completion, returning the events produced
    /// (spec §4.1). Acquires the session's exclusive lease for the
    /// duration of the turn (spec §5); queues if `queue_busy_sessions` is
    /// set, otherwise fails fast with `SessionBusy`.
    pub async fn run(&self, key: &SessionKey, user_text: &str) -> AarResult<Vec<Event>> {
        let storage_id = key.as_storage_id();

        let _lease = if self.config.queue_busy_sessions {
            self.leases.acquire(&storage_id).await
        } else {
            self.leases.try_acquire(&storage_id).ok_or_else(|| AarError::SessionBusy(storage_id.clone()))?
        };

        if self.store.get(key).await?.is_none() {
            self.store.create(key.clone()).await?;
        }
        self.mode_state_handle(&storage_id);

        self.store.append(key, Turn::UserMessage { text: user_text.to_string() }).await?;

        let span = tracing::info_span!("aar.turn", session_id = %key.session_id, app = %key.app, user = %key.user);
        self.run_inner(key, &storage_id).instrument(span).await
    }

    async fn run_inner(&self, key: &SessionKey, storage_id: &str) -> AarResult<Vec<Event>> {
        let mut events = Vec::new();
        let mode_state = self.mode_state_handle(storage_id);

        for iteration in 0..self.config.max_inner_iterations {
            tracing::debug!(iteration, "running inner iteration");

            let session = self.store.get(key).await?.ok_or_else(|| AarError::SessionNotFound(storage_id.to_string()))?;

            let (instruction, tool_schemas, plan_snapshot) = {
                let state = mode_state.lock().await;
                let schemas: Vec<serde_json::Value> = state.mode.active_tool_set.iter().map(|d: &ToolDescriptor| d.input_schema.clone()).collect();
                (state.mode.instruction_text.clone(), schemas, state.plan_pact.clone())
            };

            let request = LlmRequest { instruction, turns: session.turns.clone(), tool_schemas, json_mode: false };

            let response = match self.invoke_llm_with_retry(request).await {
                Ok(response) => response,
                Err(err) => {
                    let call_id = uuid::Uuid::new_v4().to_string();
                    self.store
                        .append(
                            key,
                            Turn::ToolResult { id: call_id, name: "llm".to_string(), result: aar_kernel::turn::ToolOutcome::Error { tag: err.tag().to_string(), message: err.to_string() } },
                        )
                        .await?;
                    continue;
                }
            };

            let enforcer_enabled = self.config.enable_enforcer;
            match enforcer::enforce(&response.parts, &plan_snapshot, enforcer_enabled) {
                EnforcerVerdict::Block(message) => {
                    events.push(Event::EnforcerBlock { message: message.clone() });
                    self.store.append(key, enforcer::block_turn(&uuid::Uuid::new_v4().to_string(), &message)).await?;
                    return Ok(events);
                }
                EnforcerVerdict::Pass => {}
            }

            self.store.append(key, Turn::ModelMessage { parts: response.parts.clone() }).await?;
            for part in &response.parts {
                match part {
                    MessagePart::Text { text } => events.push(Event::ModelText { text: text.clone() }),
                    MessagePart::ToolCall { id, name, args } => events.push(Event::ToolCall { id: id.clone(), name: name.clone(), args: args.clone() }),
                }
            }

            let should_switch = {
                let mut state = mode_state.lock().await;
                state.mode_manager.should_switch(response.token_count)
            };
            if should_switch {
                self.perform_switch(key, &mode_state).await?;
                let preview = { mode_state.lock().await.mode.instruction_text.chars().take(100).collect() };
                events.push(Event::ModeSwitched { instruction_preview: preview });
            }

            let tool_calls: Vec<(String, String, serde_json::Value)> = response
                .parts
                .into_iter()
                .filter_map(|p| match p {
                    MessagePart::ToolCall { id, name, args } => Some((id, name, args)),
                    _ => None,
                })
                .collect();

            if tool_calls.is_empty() {
                continue;
            }

            let mut final_answer = None;
            let mut awaiting_confirmation = false;
            let results = self.dispatch_all(&mode_state, &tool_calls).await;
            for ((id, name, _args), (outcome, effect)) in tool_calls.into_iter().zip(results.into_iter()) {
                let result_value = serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null);
                match effect {
                    DispatchEffect::Terminal => {
                        if let aar_kernel::turn::ToolOutcome::Ok { value } = &outcome {
                            final_answer = Some(value.get("answer").or_else(|| value.get("question")).and_then(|v| v.as_str()).unwrap_or_default().to_string());
                        }
                    }
                    DispatchEffect::AwaitingConfirmation => awaiting_confirmation = true,
                    DispatchEffect::None => {}
                }
                events.push(Event::ToolResult { id: id.clone(), name: name.clone(), result: result_value });
                self.store.append(key, Turn::ToolResult { id, name, result: outcome }).await?;
            }

            if let Some(answer) = final_answer {
                events.push(Event::Final { answer, timed_out: false });
                return Ok(events);
            }

            // A `require_confirmation` tool was called: suspend the turn
            // here. `resume_confirmation` picks it back up once the host
            // replies with a `functionResponse` for the pending call.
            if awaiting_confirmation {
                return Ok(events);
            }
        }

        events.push(Event::Final { answer: String::new(), timed_out: true });
        Ok(events)
    }

    /// Dispatches sibling tool calls from one model response concurrently;
    /// results are returned in the calls' declared order regardless of
    /// completion order (spec §5).
    async fn dispatch_all(&self, mode_state: &Arc<AsyncMutex<SessionModeState>>, calls: &[(String, String, serde_json::Value)]) -> Vec<(aar_kernel::turn::ToolOutcome, DispatchEffect)> {
        let futures = calls.iter().map(|(_, name, args)| {
            let name = name.clone();
            let args = args.clone();
            let mode_state = mode_state.clone();
            async move {
                let mut state = mode_state.lock().await;
                tools::dispatch(&name, &args, &mut state, &self.services, &self.skills).await
            }
        });
        join_all(futures).await
    }

    async fn invoke_llm_with_retry(&self, request: LlmRequest) -> AarResult<aar_kernel::llm::LlmResponse> {
        let retry_cfg = RetryConfig::default();
        retry_with_policy(
            &retry_cfg,
            |err| matches!(err, AarError::LlmUnavailable(_) | AarError::Timeout { .. } | AarError::Transport(_)),
            || {
                let request = request.clone();
                let llm = self.llm.clone();
                async move { llm.complete(request).await }
            },
        )
        .await
        .map_err(|e| e.as_llm_unavailable())
    }

    async fn perform_switch(&self, key: &SessionKey, mode_state: &Arc<AsyncMutex<SessionModeState>>) -> AarResult<()> {
        let storage_id = key.as_storage_id();
        let session = self.store.get(key).await?.ok_or_else(|| AarError::SessionNotFound(storage_id.clone()))?;
        let summary = mode_manager::summarize_recent_turns(&session.turns);
        let builtins = tools::builtin_tool_set();

        let new_mode = mode_manager::switch(self.meta_llm.as_ref(), self.config.meta_llm_timeout_secs, &summary, &builtins, self.services.mcp.as_deref(), &self.skills).await;

        if let Some(mode) = new_mode {
            let mut state = mode_state.lock().await;
            state.mode = mode;
            drop(state);

            // Session turns are cleared on switch (spec §4.3 step 4): the
            // new instruction carries the summary forward, so the log is
            // reset to empty rather than replayed. On failure the previous
            // Mode and turn log are both left untouched.
            self.store.delete(key).await?;
            self.store.create(key.clone()).await?;
        }
        Ok(())
    }

    /// Resumes a turn suspended on `DispatchEffect::AwaitingConfirmation`
    /// (spec §4.2, §6): records the host's confirmation as a `ToolResult`,
    /// then re-enters the inner loop so the model sees the outcome.
    pub async fn resume_confirmation(&self, key: &SessionKey, call_id: &str, tool_name: &str, args: serde_json::Value, confirmed: bool) -> AarResult<Vec<Event>> {
        let storage_id = key.as_storage_id();

        let _lease = if self.config.queue_busy_sessions {
            self.leases.acquire(&storage_id).await
        } else {
            self.leases.try_acquire(&storage_id).ok_or_else(|| AarError::SessionBusy(storage_id.clone()))?
        };

        let mode_state = self.mode_state_handle(&storage_id);
        let mut events = Vec::new();

        let outcome = if confirmed {
            let mut confirmed_args = args;
            if let serde_json::Value::Object(map) = &mut confirmed_args {
                map.insert("confirmed".to_string(), serde_json::Value::Bool(true));
            }
            let mut state = mode_state.lock().await;
            let (outcome, _effect) = tools::dispatch(tool_name, &confirmed_args, &mut state, &self.services, &self.skills).await;
            outcome
        } else {
            aar_kernel::turn::ToolOutcome::Error { tag: "EnforcerBlocked".to_string(), message: "user declined the confirmation request".to_string() }
        };

        let result_value = serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null);
        events.push(Event::ToolResult { id: call_id.to_string(), name: tool_name.to_string(), result: result_value });
        self.store.append(key, Turn::ToolResult { id: call_id.to_string(), name: tool_name.to_string(), result: outcome }).await?;

        let mut tail = self.run_inner(key, &storage_id).await?;
        events.append(&mut tail);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aar_foundation::{InMemoryStore, MockWallet, SessionStore};
    use aar_kernel::llm::FakeLlmProvider;
    use aar_kernel::tool::ToolDescriptor;
    use aar_foundation::SkillRegistry;
    use serde_json::json;

    fn new_core(llm: FakeLlmProvider) -> AdaptiveAgentCore {
        let services = Arc::new(RuntimeServices { wallet: Arc::new(MockWallet::new("agent-wallet", 100.0)), mcp: None, a2a: None, skill_locals: crate::tools::SkillLocalRegistry::new() });
        AdaptiveAgentCore::new(aar_kernel::config::RuntimeConfig::default(), Arc::new(InMemoryStore::new()), Arc::new(SkillRegistry::empty()), services, Arc::new(llm), Arc::new(FakeLlmProvider::new(vec![])))
    }

    #[tokio::test]
    async fn confirmation_required_tool_suspends_then_resumes_the_turn() {
        let llm = FakeLlmProvider::new(vec![FakeLlmProvider::tool_call("1", "send_payment", json!({"recipient": "vendor", "amount": 5.0}), 5)]);
        let core = new_core(llm);
        let key = SessionKey::new("app", "user", "s1");

        let storage_id = key.as_storage_id();
        {
            let mode_state = core.mode_state_handle(&storage_id);
            let mut state = mode_state.lock().await;
            state.mode.active_tool_set.insert(ToolDescriptor { require_confirmation: true, ..ToolDescriptor::builtin("send_payment", "send a payment", json!({})) });
        }

        let events = core.run(&key, "please pay the vendor").await.unwrap();
        assert!(!events.iter().any(|e| matches!(e, Event::Final { .. })), "the turn must suspend, not complete");
        let pending = events.iter().find_map(|e| match e {
            Event::ToolResult { id, name, result } if result.get("awaiting_confirmation").is_some() => Some((id.clone(), name.clone())),
            _ => None,
        });
        let (call_id, tool_name) = pending.expect("expected an awaiting_confirmation ToolResult");

        let llm_after = FakeLlmProvider::new(vec![FakeLlmProvider::tool_call("2", "attempt_answer", json!({"answer": "paid"}), 5)]);
        let core = AdaptiveAgentCore { llm: Arc::new(llm_after), ..core };
        let resumed = core.resume_confirmation(&key, &call_id, &tool_name, json!({"recipient": "vendor", "amount": 5.0}), true).await.unwrap();
        assert!(resumed.iter().any(|e| matches!(e, Event::Final { answer, .. } if answer == "paid")));
    }
}
