//! # Claim Endpoint
//!
//! `POST {base}/api/claim/{item_id}` as multipart:
//! - `claimerStudent`: student number
//! - `claimerName`: display name from the directory
//! - `photo`: captured evidence, file name `claim.jpg`
//!
//! Any 2xx means the claim is recorded. A 2xx whose body can't be read is
//! still a success, only without a claim id.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registry::ClaimReceipt;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use tracing::{debug, warn};

use crate::{error::EndpointError, gate::Evidence, session::ItemReference};

#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub claimant_identifier: String,
    pub claimant_name: String,
    pub evidence: Evidence,
}

/// Server acknowledgement. Missing fields fall back to "N/A" and local time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimAck {
    pub claim_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<ClaimReceipt> for ClaimAck {
    fn from(receipt: ClaimReceipt) -> Self {
        Self {
            claim_id: Some(receipt.claim_id),
            timestamp: Some(receipt.timestamp),
        }
    }
}

#[async_trait]
pub trait ClaimEndpoint: Send + Sync {
    async fn submit_claim(
        &self,
        item: &ItemReference,
        request: &ClaimRequest,
    ) -> Result<ClaimAck, EndpointError>;
}

pub struct HttpClaimEndpoint {
    client: Client,
    base_url: String,
}

impl HttpClaimEndpoint {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    fn url(&self, item_id: u64) -> String {
        format!("{}/api/claim/{item_id}", self.base_url)
    }
}

#[async_trait]
impl ClaimEndpoint for HttpClaimEndpoint {
    async fn submit_claim(
        &self,
        item: &ItemReference,
        request: &ClaimRequest,
    ) -> Result<ClaimAck, EndpointError> {
        let photo = Part::bytes(request.evidence.data().to_vec())
            .file_name("claim.jpg")
            .mime_str(request.evidence.content_type())?;

        let form = Form::new()
            .text("claimerStudent", request.claimant_identifier.clone())
            .text("claimerName", request.claimant_name.clone())
            .part("photo", photo);

        let response = self
            .client
            .post(self.url(item.id))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, item_id = item.id, "Claim endpoint rejected request");
            return Err(EndpointError::Rejected {
                status: status.as_u16(),
            });
        }

        match response.json::<ClaimReceipt>().await {
            Ok(receipt) => Ok(receipt.into()),
            Err(e) => {
                warn!("Claim recorded but reply unreadable: {e}");
                Ok(ClaimAck::default())
            }
        }
    }
}
