use crate::client::BookingApi;
use crate::core::errors::{ApiError, CycleError};
use crate::core::models::{Appointment, Credential};

#[derive(Debug)]
pub struct PollSuccess {
    pub appointments: Vec<Appointment>,
    /// Set when the search forced a token refresh; the caller owns the
    /// credential and must install this one for subsequent cycles.
    pub refreshed: Option<Credential>,
}

/// One search attempt, with the single refresh-and-retry the provider's
/// short-lived tokens require. A 403 on the retried search is reported as
/// a fetch failure; there is never a second refresh within one cycle.
pub async fn poll_once(
    api: &dyn BookingApi,
    credential: &Credential,
) -> Result<PollSuccess, CycleError> {
    match api.search(credential).await {
        Ok(appointments) => Ok(PollSuccess {
            appointments,
            refreshed: None,
        }),
        Err(ApiError::Forbidden) => {
            tracing::info!("Credential rejected, refreshing token");
            let fresh = api.login().await.map_err(CycleError::AuthRefresh)?;
            tracing::info!("Token refreshed, retrying search");
            let appointments = api.search(&fresh).await.map_err(CycleError::Fetch)?;
            Ok(PollSuccess {
                appointments,
                refreshed: Some(fresh),
            })
        }
        Err(err) => Err(CycleError::Fetch(err)),
    }
}
