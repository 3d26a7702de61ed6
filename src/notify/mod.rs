mod alert;
mod telegram;

use crate::core::settings::TelegramSettings;
use alert::{platform_alert, LocalAlert};
use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;
use telegram::TelegramNotifier;

/// Fan-out for the "early appointment found" event: a Telegram message plus
/// a local desktop alert. Delivery is best-effort on both channels; failures
/// are logged and never bubble into the watch loop.
pub struct Notifier {
    telegram: TelegramNotifier,
    alert: Box<dyn LocalAlert>,
}

impl Notifier {
    pub fn new(settings: &TelegramSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            telegram: TelegramNotifier::new(settings, timeout)?,
            alert: platform_alert(),
        })
    }

    pub async fn notify_found(&self, date: NaiveDate) {
        let message = format!("🚨 EARLY APPOINTMENT FOUND! 🚨\n\nEarliest available date: {date}");

        if let Err(e) = self.telegram.send(&message).await {
            tracing::warn!(error = %e, "Telegram notification failed");
        }

        self.alert.alert("ICBC", "Appointment available!");
    }

    /// Exercises both channels so a new configuration can be verified
    /// without waiting for a real appointment.
    pub async fn notify_test(&self) {
        if let Err(e) = self.telegram.send("icbc-watch test notification").await {
            tracing::warn!(error = %e, "Telegram notification failed");
        }

        self.alert.alert("ICBC", "icbc-watch test notification");
    }
}
