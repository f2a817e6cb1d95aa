//! Session CRUD (spec §6): create, fetch, and delete a session's turn log.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use aar_foundation::SessionStore as _;
use aar_kernel::error::AarError;
use aar_kernel::turn::{Session, SessionKey};

use crate::error::{GatewayError, GatewayResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionView {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub turns: Vec<aar_kernel::turn::Turn>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            app_name: session.key.app,
            user_id: session.key.user,
            session_id: session.key.session_id,
            turns: session.turns,
        }
    }
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path((app_name, user_id, session_id)): Path<(String, String, String)>,
) -> GatewayResult<Json<SessionView>> {
    let key = SessionKey::new(app_name, user_id, session_id);
    let session = state.core.store.create(key).await?;
    Ok(Json(session.into()))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path((app_name, user_id, session_id)): Path<(String, String, String)>,
) -> GatewayResult<Json<SessionView>> {
    let key = SessionKey::new(app_name, user_id, session_id);
    let session = state.core.store.get(&key).await?.ok_or_else(|| GatewayError::Runtime(AarError::SessionNotFound(key.as_storage_id())))?;
    Ok(Json(session.into()))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((app_name, user_id, session_id)): Path<(String, String, String)>,
) -> GatewayResult<Json<serde_json::Value>> {
    let key = SessionKey::new(app_name, user_id, session_id);
    state.core.store.get(&key).await?.ok_or_else(|| GatewayError::Runtime(AarError::SessionNotFound(key.as_storage_id())))?;
    state.core.store.delete(&key).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path((app_name, user_id)): Path<(String, String)>,
) -> GatewayResult<Json<Vec<String>>> {
    let keys = state.core.store.list(&app_name, &user_id).await?;
    Ok(Json(keys.into_iter().map(|k| k.session_id).collect()))
}
