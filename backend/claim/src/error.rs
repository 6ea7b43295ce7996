use thiserror::Error;

/// Rejections surfaced by a claim session.
///
/// None of these change session state. Only `DeviceUnavailable` ends the
/// session; everything else can be retried once the cause is fixed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Capture is not allowed yet, look at the camera")]
    NotReady,

    #[error("Face ID already secured for this session")]
    AlreadyCaptured,

    #[error("Student number {0:?} not found")]
    IdentityNotFound(String),

    #[error("Capture Face ID before confirming the claim")]
    EvidenceMissing,

    #[error("A claim is already being processed")]
    InProgress,

    #[error("This claim has already succeeded")]
    AlreadySucceeded,

    #[error("Claim session was cancelled")]
    Cancelled,
}

/// Failures reported by a claim endpoint for one dispatched request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Server rejected claim with status {status}")]
    Rejected { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for EndpointError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => EndpointError::Rejected {
                status: status.as_u16(),
            },
            None => EndpointError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_message_quotes_input() {
        let err = ClaimError::IdentityNotFound("2021999".to_string());
        assert!(err.to_string().contains("\"2021999\""));
    }

    #[test]
    fn test_rejected_message() {
        let err = EndpointError::Rejected { status: 409 };
        assert_eq!(err.to_string(), "Server rejected claim with status 409");
    }
}
