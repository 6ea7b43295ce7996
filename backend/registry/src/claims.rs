//! # Claims
//!
//! What the claim endpoint hands back, what the claimed list shows, and
//! ownership appeals against a claim.
//!
//! ## Appeals
//!
//! - Appellant must be a known student
//! - Reason must not be blank
//! - Ticket id is `APP-` followed by the filing time in unix millis
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{items::Item, students::StudentDirectory};

/// Success body of `POST /api/claim/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub claim_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedItem {
    #[serde(flatten)]
    pub item: Item,
    pub claim_id: String,
    pub claimer_student: String,
    pub claimer_name: String,
    pub claim_date: DateTime<Utc>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AppealError {
    #[error("Please enter a valid Student Number from the records")]
    UnknownStudent,

    #[error("Please provide a reason for the appeal")]
    MissingReason,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealRequest {
    pub student_number: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealTicket {
    pub ticket_id: String,
    pub item_name: String,
    pub appellant: String,
    pub reason: String,
    pub filed_at: DateTime<Utc>,
}

pub fn file_appeal(
    directory: &StudentDirectory,
    claimed: &ClaimedItem,
    request: &AppealRequest,
    now: DateTime<Utc>,
) -> Result<AppealTicket, AppealError> {
    let student_number = request.student_number.trim();
    let name = directory
        .resolve(student_number)
        .ok_or(AppealError::UnknownStudent)?;

    let reason = request.reason.trim();
    if reason.is_empty() {
        return Err(AppealError::MissingReason);
    }

    Ok(AppealTicket {
        ticket_id: format!("APP-{}", now.timestamp_millis()),
        item_name: claimed.item.name.clone(),
        appellant: format!("{name} ({student_number})"),
        reason: reason.to_string(),
        filed_at: now,
    })
}
