use crate::core::errors::CycleError;
use chrono::NaiveDate;
use std::time::Duration;

/// Result of one full poll cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// An appointment exists on or before the target date.
    Found(NaiveDate),
    /// Appointments exist, but the earliest is past the target date.
    NotEarly(NaiveDate),
    /// The provider returned no appointments at all.
    Empty,
    Failed(CycleError),
}

/// The loop has two states: normal polling, and a fixed backoff after any
/// recoverable failure. Transitions are pure so tests can drive cycles
/// without real waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Polling,
    Backoff,
}

impl DriverState {
    pub fn after(outcome: &CycleOutcome) -> Self {
        match outcome {
            CycleOutcome::Failed(_) => DriverState::Backoff,
            _ => DriverState::Polling,
        }
    }

    pub fn wait(&self, poll_interval: Duration, backoff: Duration) -> Duration {
        match self {
            DriverState::Polling => poll_interval,
            DriverState::Backoff => backoff,
        }
    }
}

/// Maps the evaluator's result onto a cycle outcome against the target
/// date. An appointment is early when its date is on or before the target.
pub fn classify(earliest: Option<NaiveDate>, target: NaiveDate) -> CycleOutcome {
    match earliest {
        Some(date) if date <= target => CycleOutcome::Found(date),
        Some(date) => CycleOutcome::NotEarly(date),
        None => CycleOutcome::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{ApiError, CycleError};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_classify_early_appointment() {
        let outcome = classify(Some(day(2025, 6, 5)), day(2025, 6, 8));
        assert!(matches!(outcome, CycleOutcome::Found(d) if d == day(2025, 6, 5)));
    }

    #[test]
    fn test_classify_on_target_date_counts_as_early() {
        let outcome = classify(Some(day(2025, 6, 8)), day(2025, 6, 8));
        assert!(matches!(outcome, CycleOutcome::Found(d) if d == day(2025, 6, 8)));
    }

    #[test]
    fn test_classify_late_appointment() {
        let outcome = classify(Some(day(2025, 7, 1)), day(2025, 6, 8));
        assert!(matches!(outcome, CycleOutcome::NotEarly(d) if d == day(2025, 7, 1)));
    }

    #[test]
    fn test_classify_empty_batch() {
        assert!(matches!(
            classify(None, day(2025, 6, 8)),
            CycleOutcome::Empty
        ));
    }

    #[test]
    fn test_failure_enters_backoff() {
        let outcome = CycleOutcome::Failed(CycleError::AuthRefresh(ApiError::MissingToken));
        assert_eq!(DriverState::after(&outcome), DriverState::Backoff);
    }

    #[test]
    fn test_success_stays_polling() {
        for outcome in [
            CycleOutcome::Found(day(2025, 6, 5)),
            CycleOutcome::NotEarly(day(2025, 7, 1)),
            CycleOutcome::Empty,
        ] {
            assert_eq!(DriverState::after(&outcome), DriverState::Polling);
        }
    }

    #[test]
    fn test_wait_durations() {
        let poll = Duration::from_secs(60);
        let backoff = Duration::from_secs(90);
        assert_eq!(DriverState::Polling.wait(poll, backoff), poll);
        assert_eq!(DriverState::Backoff.wait(poll, backoff), backoff);
    }
}
