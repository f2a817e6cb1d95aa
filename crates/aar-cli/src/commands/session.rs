use comfy_table::Table;

use aar_foundation::SessionStore as _;
use aar_kernel::turn::SessionKey;
use aar_runtime::AdaptiveAgentCore;

use crate::error::CliError;

pub async fn create(core: &AdaptiveAgentCore, app: &str, user: &str, session: &str) -> Result<(), CliError> {
    let key = SessionKey::new(app, user, session);
    core.store.create(key.clone()).await?;
    println!("created session {}", key.as_storage_id());
    Ok(())
}

pub async fn get(core: &AdaptiveAgentCore, app: &str, user: &str, session: &str) -> Result<(), CliError> {
    let key = SessionKey::new(app, user, session);
    let found = core.store.get(&key).await?.ok_or_else(|| CliError::Runtime(aar_kernel::error::AarError::SessionNotFound(key.as_storage_id())))?;
    println!("{}", serde_json::to_string_pretty(&found).map_err(|e| CliError::Config(e.to_string()))?);
    Ok(())
}

pub async fn delete(core: &AdaptiveAgentCore, app: &str, user: &str, session: &str) -> Result<(), CliError> {
    let key = SessionKey::new(app, user, session);
    core.store.get(&key).await?.ok_or_else(|| CliError::Runtime(aar_kernel::error::AarError::SessionNotFound(key.as_storage_id())))?;
    core.store.delete(&key).await?;
    println!("deleted session {}", key.as_storage_id());
    Ok(())
}

pub async fn list(core: &AdaptiveAgentCore, app: &str, user: &str) -> Result<(), CliError> {
    let keys = core.store.list(app, user).await?;
    let mut table = Table::new();
    table.set_header(vec!["session_id"]);
    for key in keys {
        table.add_row(vec![key.session_id]);
    }
    println!("{table}");
    Ok(())
}
