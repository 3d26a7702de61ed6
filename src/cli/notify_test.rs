use crate::core::settings::{Settings, TelegramSettings};
use crate::notify::Notifier;
use anyhow::Result;
use std::time::Duration;

/// Fires a test notification through both channels so the Telegram token,
/// chat id, and local alert setup can be verified in isolation.
pub async fn run() -> Result<()> {
    let settings = Settings::load()?;
    settings.validate()?;
    let telegram = TelegramSettings::from_env()?;

    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let notifier = Notifier::new(&telegram, timeout)?;
    notifier.notify_test().await;

    Ok(())
}
