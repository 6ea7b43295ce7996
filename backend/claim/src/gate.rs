//! # Capture Gate
//!
//! Turns the current frame into the session's evidence, once.
//!
//! ## Preconditions
//!
//! - Nothing captured yet, otherwise `AlreadyCaptured`
//! - Readiness is `Ready` or `TimedOutManualOverride`, otherwise `NotReady`
//! - The camera has produced at least one frame, otherwise `NotReady`
//!
//! ## Effect
//!
//! Freezes the readiness cell (which stops the poller), then stores the
//! frame as evidence. No re-capture within a session, a new session is
//! needed to retry.
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    device::{CaptureDevice, Frame},
    error::ClaimError,
    liveness::ReadinessCell,
};

/// Captured frame submitted as proof of claim. Cloning shares the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    data: Bytes,
    content_type: String,
    captured_at: DateTime<Utc>,
}

impl Evidence {
    pub fn from_frame(frame: Frame, captured_at: DateTime<Utc>) -> Self {
        Self {
            data: frame.data,
            content_type: frame.content_type,
            captured_at,
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CaptureGate {
    evidence: Option<Evidence>,
}

impl CaptureGate {
    pub fn fire(
        &mut self,
        readiness: &ReadinessCell,
        device: &CaptureDevice,
    ) -> Result<Evidence, ClaimError> {
        if self.evidence.is_some() {
            return Err(ClaimError::AlreadyCaptured);
        }

        if !device.is_open() {
            return Err(ClaimError::DeviceUnavailable(
                "capture device is closed".to_string(),
            ));
        }

        if !readiness.current().permits_capture() {
            return Err(ClaimError::NotReady);
        }

        let frame = device.current_frame().ok_or(ClaimError::NotReady)?;
        let signal = readiness
            .freeze_for_capture()
            .ok_or(ClaimError::NotReady)?;

        let evidence = Evidence::from_frame(frame, Utc::now());
        info!(bytes = evidence.len(), %signal, "Face ID secured");

        self.evidence = Some(evidence.clone());

        Ok(evidence)
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }

    pub fn is_consumed(&self) -> bool {
        self.evidence.is_some()
    }
}
