use aar_foundation::SessionStore as _;
use aar_kernel::event::Event;
use aar_kernel::turn::SessionKey;
use aar_runtime::AdaptiveAgentCore;

use crate::error::CliError;

pub async fn run(core: &AdaptiveAgentCore, app: &str, user: &str, session: &str, text: &str) -> Result<(), CliError> {
    let key = SessionKey::new(app, user, session);
    if core.store.get(&key).await?.is_none() {
        core.store.create(key.clone()).await?;
    }

    let events = core.run(&key, text).await?;

    let blocked = events.iter().any(|e| matches!(e, Event::EnforcerBlock { .. })) && !events.iter().any(Event::is_final);
    println!("{}", serde_json::to_string_pretty(&events).map_err(|e| CliError::Config(e.to_string()))?);

    if blocked {
        let message = events
            .iter()
            .find_map(|e| match e {
                Event::EnforcerBlock { message } => Some(message.clone()),
                _ => None,
            })
            .unwrap_or_default();
        return Err(CliError::EnforcerBlocked(message));
    }

    Ok(())
}
