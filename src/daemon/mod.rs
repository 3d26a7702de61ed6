mod driver;

pub use driver::{classify, CycleOutcome, DriverState};

use crate::client::{poll_once, BookingApi, IcbcClient};
use crate::core::models::{earliest, Credential};
use crate::core::settings::Config;
use crate::notify::Notifier;
use anyhow::Result;
use chrono::NaiveDate;
use std::time::Duration;

pub async fn run(config: Config) -> Result<()> {
    let timeout = Duration::from_secs(config.settings.request_timeout_secs);
    let client = IcbcClient::new(config.identity.clone(), config.settings.search.clone(), timeout)?;
    let notifier = Notifier::new(&config.telegram, timeout)?;

    tracing::info!(
        target_date = %config.target_date,
        location_id = config.settings.search.location_id,
        exam_type = %config.settings.search.exam_type,
        poll_interval_secs = config.settings.poll_interval_secs,
        "Starting appointment watch"
    );

    tokio::select! {
        _ = watch_loop(&client, &notifier, &config) => unreachable!("watch loop never returns"),
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutdown signal received, stopping");
            Ok(())
        }
    }
}

async fn watch_loop(api: &dyn BookingApi, notifier: &Notifier, config: &Config) {
    let poll_interval = Duration::from_secs(config.settings.poll_interval_secs);
    let backoff = Duration::from_secs(config.settings.backoff_secs);

    // The single live credential. Replaced on bootstrap and whenever a
    // cycle's refresh produced a new token.
    let mut credential: Option<Credential> = None;

    loop {
        let outcome = run_cycle(api, &mut credential, config.target_date).await;

        match &outcome {
            CycleOutcome::Found(date) => {
                tracing::info!(%date, "Early appointment found");
                notifier.notify_found(*date).await;
            }
            CycleOutcome::NotEarly(date) => {
                tracing::info!(earliest = %date, target = %config.target_date, "No early appointments");
            }
            CycleOutcome::Empty => {
                tracing::info!("No appointments available");
            }
            CycleOutcome::Failed(e) => {
                tracing::warn!(error = %e, detail = ?e, "Cycle failed, backing off");
            }
        }

        let state = DriverState::after(&outcome);
        let wait = state.wait(poll_interval, backoff);
        tracing::debug!(?state, wait_secs = wait.as_secs(), "Waiting before next check");
        tokio::time::sleep(wait).await;
    }
}

/// One poll cycle: ensure a credential exists (explicit login on the first
/// cycle and after a failed bootstrap), search with the single
/// refresh-and-retry, evaluate the batch against the target date.
async fn run_cycle(
    api: &dyn BookingApi,
    credential: &mut Option<Credential>,
    target: NaiveDate,
) -> CycleOutcome {
    use crate::core::errors::CycleError;

    let current = match credential.as_ref() {
        Some(current) => current.clone(),
        None => {
            tracing::info!("No credential yet, logging in");
            match api.login().await {
                Ok(fresh) => {
                    *credential = Some(fresh.clone());
                    fresh
                }
                Err(e) => return CycleOutcome::Failed(CycleError::AuthRefresh(e)),
            }
        }
    };

    let success = match poll_once(api, &current).await {
        Ok(success) => success,
        Err(e) => return CycleOutcome::Failed(e),
    };

    if let Some(fresh) = success.refreshed {
        *credential = Some(fresh);
    }

    tracing::debug!(count = success.appointments.len(), "Fetched appointments");

    match earliest(&success.appointments) {
        Ok(date) => classify(date, target),
        Err(e) => CycleOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{ApiError, CycleError};
    use crate::core::models::{Appointment, AppointmentDt};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn appointment(date: &str) -> Appointment {
        Appointment {
            appointment_dt: AppointmentDt {
                date: date.to_string(),
                day_of_week: None,
            },
            start_tm: None,
            end_tm: None,
            signature: None,
        }
    }

    struct ScriptedApi {
        logins: Mutex<Vec<Result<&'static str, ApiError>>>,
        searches: Mutex<Vec<Result<Vec<Appointment>, ApiError>>>,
    }

    impl ScriptedApi {
        fn new(
            logins: Vec<Result<&'static str, ApiError>>,
            searches: Vec<Result<Vec<Appointment>, ApiError>>,
        ) -> Self {
            Self {
                logins: Mutex::new(logins),
                searches: Mutex::new(searches),
            }
        }
    }

    #[async_trait]
    impl BookingApi for ScriptedApi {
        async fn login(&self) -> Result<Credential, ApiError> {
            self.logins
                .lock()
                .unwrap()
                .remove(0)
                .map(Credential::new)
        }

        async fn search(&self, _credential: &Credential) -> Result<Vec<Appointment>, ApiError> {
            self.searches.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_bootstrap_login_then_found() {
        let api = ScriptedApi::new(
            vec![Ok("Bearer first")],
            vec![Ok(vec![appointment("2025-06-10"), appointment("2025-06-05")])],
        );
        let mut credential = None;

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(outcome, CycleOutcome::Found(d) if d == day(2025, 6, 5)));
        assert_eq!(credential, Some(Credential::new("Bearer first")));
    }

    #[tokio::test]
    async fn test_bootstrap_login_failure_is_recoverable() {
        let api = ScriptedApi::new(vec![Err(ApiError::MissingToken)], vec![]);
        let mut credential = None;

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleError::AuthRefresh(ApiError::MissingToken))
        ));
        assert_eq!(credential, None);
        assert_eq!(DriverState::after(&outcome), DriverState::Backoff);
    }

    #[tokio::test]
    async fn test_expired_credential_is_replaced_for_later_cycles() {
        let api = ScriptedApi::new(
            vec![Ok("Bearer second")],
            vec![Err(ApiError::Forbidden), Ok(vec![appointment("2025-07-01")])],
        );
        let mut credential = Some(Credential::new("Bearer first"));

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(outcome, CycleOutcome::NotEarly(d) if d == day(2025, 7, 1)));
        assert_eq!(credential, Some(Credential::new("Bearer second")));
    }

    #[tokio::test]
    async fn test_failed_refresh_enters_backoff_and_keeps_old_credential() {
        // Scenario D: search 403, refresh returns no token.
        let api = ScriptedApi::new(
            vec![Err(ApiError::MissingToken)],
            vec![Err(ApiError::Forbidden)],
        );
        let mut credential = Some(Credential::new("Bearer stale"));

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleError::AuthRefresh(_))
        ));
        assert_eq!(credential, Some(Credential::new("Bearer stale")));
        assert_eq!(DriverState::after(&outcome), DriverState::Backoff);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_a_failure() {
        let api = ScriptedApi::new(vec![], vec![Ok(vec![])]);
        let mut credential = Some(Credential::new("Bearer ok"));

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(outcome, CycleOutcome::Empty));
        assert_eq!(DriverState::after(&outcome), DriverState::Polling);
    }

    #[tokio::test]
    async fn test_malformed_date_fails_the_cycle() {
        let api = ScriptedApi::new(vec![], vec![Ok(vec![appointment("06/05/2025")])]);
        let mut credential = Some(Credential::new("Bearer ok"));

        let outcome = run_cycle(&api, &mut credential, day(2025, 6, 8)).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleError::Parse { .. })
        ));
        assert_eq!(DriverState::after(&outcome), DriverState::Backoff);
    }
}
