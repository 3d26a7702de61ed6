use crate::core::errors::CycleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bearer token issued by the web login endpoint. ICBC returns the full
/// header value (including the `Bearer ` prefix) in the `Authorization`
/// response header. There is no expiry field; expiry shows up as a 403 on
/// the next search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub appointment_dt: AppointmentDt,
    #[serde(default)]
    pub start_tm: Option<String>,
    #[serde(default)]
    pub end_tm: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDt {
    pub date: String,
    #[serde(default)]
    pub day_of_week: Option<String>,
}

/// Earliest calendar date among the batch. An empty batch has no earliest.
/// A malformed date in any record fails the whole batch; the next cycle
/// gets a fresh response rather than a silently partial one.
pub fn earliest(batch: &[Appointment]) -> Result<Option<NaiveDate>, CycleError> {
    let mut min: Option<NaiveDate> = None;

    for appointment in batch {
        let raw = appointment.appointment_dt.date.as_str();
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|source| {
            CycleError::Parse {
                value: raw.to_string(),
                source,
            }
        })?;
        min = Some(match min {
            Some(current) => current.min(date),
            None => date,
        });
    }

    Ok(min)
}
