use crate::client::{poll_once, BookingApi, IcbcClient};
use crate::core::models::earliest;
use crate::core::settings::Config;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct CheckOutput {
    earliest: Option<NaiveDate>,
    target_date: NaiveDate,
    early: bool,
    appointments: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    checked_at: DateTime<Utc>,
}

/// One-shot poll cycle: login, search, report the earliest date. Unlike the
/// daemon, failures here are fatal so scripts get a meaningful exit code.
pub async fn run(json: bool) -> Result<()> {
    let config = Config::load()?;
    let timeout = Duration::from_secs(config.settings.request_timeout_secs);
    let client = IcbcClient::new(config.identity.clone(), config.settings.search.clone(), timeout)?;

    let credential = client.login().await.context("Login failed")?;
    let result = poll_once(&client, &credential).await?;
    let earliest_date = earliest(&result.appointments)?;

    let output = CheckOutput {
        earliest: earliest_date,
        target_date: config.target_date,
        early: earliest_date.is_some_and(|d| d <= config.target_date),
        appointments: result.appointments.len(),
        checked_at: Utc::now(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text_output(&output);
    }

    Ok(())
}

fn print_text_output(output: &CheckOutput) {
    match output.earliest {
        Some(date) if output.early => {
            println!(
                "Earliest appointment: {} (on or before target {})",
                date, output.target_date
            );
        }
        Some(date) => {
            println!(
                "Earliest appointment: {} (target {})",
                date, output.target_date
            );
        }
        None => println!("No appointments available."),
    }
    println!("{} appointment(s) in response", output.appointments);
}
