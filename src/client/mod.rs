mod poll;

pub use poll::{poll_once, PollSuccess};

use crate::core::errors::ApiError;
use crate::core::models::{Appointment, Credential};
use crate::core::settings::{Identity, SearchSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use std::time::Duration;

const LOGIN_ENDPOINT: &str = "https://onlinebusiness.icbc.com/deas-api/v1/webLogin/webLogin";
const SEARCH_ENDPOINT: &str =
    "https://onlinebusiness.icbc.com/deas-api/v1/web/getAvailableAppointments";

const LOGIN_REFERER: &str = "https://onlinebusiness.icbc.com/webdeas-ui/login;type=driver";
const SEARCH_REFERER: &str = "https://onlinebusiness.icbc.com/webdeas-ui/booking";

// The booking API sits behind a browser check; requests without a browser
// user agent are rejected.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Seam over the two provider calls, so the poll flow and the watch loop
/// can be exercised against a fake in tests.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Perform the web login and return the fresh bearer token.
    async fn login(&self) -> Result<Credential, ApiError>;

    /// Fetch the currently available appointments for the configured
    /// location and exam type.
    async fn search(&self, credential: &Credential) -> Result<Vec<Appointment>, ApiError>;
}

pub struct IcbcClient {
    client: reqwest::Client,
    identity: Identity,
    search: SearchSettings,
}

impl IcbcClient {
    pub fn new(identity: Identity, search: SearchSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            identity,
            search,
        })
    }
}

#[async_trait]
impl BookingApi for IcbcClient {
    async fn login(&self) -> Result<Credential, ApiError> {
        let body = json!({
            "drvrLastName": self.identity.last_name,
            "licenceNumber": self.identity.licence_number,
            "keyword": self.identity.keyword,
        });

        let response = self
            .client
            .put(LOGIN_ENDPOINT)
            .header("Referer", LOGIN_REFERER)
            .header("Accept", "application/json, text/plain, */*")
            .header("Cache-Control", "no-cache, no-store")
            .header("Pragma", "no-cache")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let token = response
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingToken)?;

        Ok(Credential::new(token))
    }

    async fn search(&self, credential: &Credential) -> Result<Vec<Appointment>, ApiError> {
        let body = json!({
            "aPosID": self.search.location_id,
            "examType": self.search.exam_type,
            "examDate": Local::now().date_naive().to_string(),
            "ignoreReserveTime": false,
            "prfDaysOfWeek": preference_list(&self.search.days_of_week),
            "prfPartsOfDay": preference_list(&self.search.parts_of_day),
            "lastName": self.identity.last_name,
            "licenseNumber": self.identity.licence_number,
        });

        let response = self
            .client
            .post(SEARCH_ENDPOINT)
            .header(reqwest::header::AUTHORIZATION, credential.header_value())
            .header("Referer", SEARCH_REFERER)
            .header("Accept", "application/json, text/plain, */*")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Forbidden);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

/// The API expects preference filters as a JSON array serialized into a
/// string field, e.g. `"[0,1,2,3,4,5,6]"`.
fn preference_list(values: &[u8]) -> String {
    let joined = values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{joined}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_list_format() {
        assert_eq!(preference_list(&[0, 1, 2, 3, 4, 5, 6]), "[0,1,2,3,4,5,6]");
        assert_eq!(preference_list(&[0, 1]), "[0,1]");
        assert_eq!(preference_list(&[3]), "[3]");
    }
}
