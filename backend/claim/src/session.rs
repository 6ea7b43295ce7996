//! # Claim Session
//!
//! One claim attempt for one item, from camera open to receipt.
//!
//! ## Flow
//!
//! 1. `open`: acquire the camera, start liveness polling and the override timer
//! 2. `set_claimant`: operator types a student number, the directory supplies the name
//! 3. `capture`: gate fires once readiness allows it, polling stops
//! 4. `submit`: one request at a time, failures leave evidence and identity in place
//! 5. Success renders the receipt and closes the camera
//!
//! `cancel` (or dropping the session) stops polling and closes the camera.
//! A request already in flight is not aborted. It runs to completion in its
//! own task and its result is recorded, but nothing is shown for it.
//!
//! ## Invariants
//!
//! - Once the claim succeeded nothing in the session changes again
//! - The camera is closed exactly once, by the receipt or by cancellation
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use registry::{Item, StudentDirectory};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, time::Duration};
use tracing::{debug, error, info};

use crate::{
    device::{CaptureBackend, CaptureDevice, DeviceState},
    error::{ClaimError, EndpointError},
    gate::{CaptureGate, Evidence},
    guard::{ClaimOutcome, ClaimSuccess, Dispatch, Resolution, SubmissionGuard},
    liveness::{Detector, LivenessPoller, PollerHandle, ReadinessCell, ReadinessSignal},
    receipt::{self, ReceiptView},
    remote::{ClaimAck, ClaimEndpoint, ClaimRequest},
};

/// The item being claimed. Fixed for the life of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReference {
    pub id: u64,
    pub name: String,
    pub location: String,
}

impl From<&Item> for ItemReference {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            location: item.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub detector_backoff: Duration,
    pub manual_override_after: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            detector_backoff: Duration::from_millis(500),
            manual_override_after: Duration::from_millis(5000),
        }
    }
}

/// Student number to display name.
pub trait IdentityLookup: Send + Sync {
    fn resolve(&self, identifier: &str) -> Option<String>;
}

impl IdentityLookup for StudentDirectory {
    fn resolve(&self, identifier: &str) -> Option<String> {
        StudentDirectory::resolve(self, identifier).map(str::to_string)
    }
}

/// External capabilities a session needs.
#[derive(Clone)]
pub struct ClaimServices {
    pub camera: Arc<dyn CaptureBackend>,
    pub detector: Arc<dyn Detector>,
    pub directory: Arc<dyn IdentityLookup>,
    pub endpoint: Arc<dyn ClaimEndpoint>,
}

#[derive(Default)]
struct SessionState {
    claimant_identifier: String,
    claimant_name: Option<String>,
    gate: CaptureGate,
    guard: SubmissionGuard,
    receipt: Option<ReceiptView>,
    cancelled: bool,
}

struct SessionInner {
    item: ItemReference,
    device: Arc<CaptureDevice>,
    readiness: Arc<ReadinessCell>,
    directory: Arc<dyn IdentityLookup>,
    endpoint: Arc<dyn ClaimEndpoint>,
    state: Mutex<SessionState>,
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(
        &self,
        dispatch: Dispatch,
        request: ClaimRequest,
        result: Result<ClaimAck, EndpointError>,
    ) -> Result<ClaimOutcome, ClaimError> {
        let mut state = self.lock();

        let resolution = match result {
            Ok(ack) => state.guard.complete_success(
                dispatch,
                ClaimSuccess {
                    claim_id: ack.claim_id,
                    item: self.item.clone(),
                    claimant_identifier: request.claimant_identifier,
                    claimant_name: request.claimant_name,
                    timestamp: ack.timestamp.unwrap_or_else(Utc::now),
                },
            ),
            Err(e) => state.guard.complete_failure(dispatch, e.to_string()),
        };

        if state.cancelled {
            debug!(attempt = dispatch.attempt, "Claim completed after cancel, not shown");
            return Err(ClaimError::Cancelled);
        }

        match resolution {
            Resolution::Succeeded(success) => {
                state.receipt = Some(receipt::emit(&success, &self.device));
                Ok(ClaimOutcome::Success(success))
            }
            Resolution::Failed(reason) => Ok(ClaimOutcome::Failure(reason)),
            Resolution::RaceDiscarded => Ok(state
                .guard
                .outcome()
                .cloned()
                .unwrap_or(ClaimOutcome::Pending)),
        }
    }
}

pub struct ClaimSession {
    inner: Arc<SessionInner>,
    poller: PollerHandle,
}

impl ClaimSession {
    /// Opens the camera and starts polling. Must run inside a tokio runtime.
    pub fn open(
        item: ItemReference,
        services: &ClaimServices,
        config: &SessionConfig,
    ) -> Result<Self, ClaimError> {
        let device = Arc::new(CaptureDevice::acquire(services.camera.as_ref())?);
        let readiness = Arc::new(ReadinessCell::new());

        let poller = LivenessPoller::new(
            services.detector.clone(),
            device.clone(),
            readiness.clone(),
            config,
        )
        .spawn();

        info!(item_id = item.id, item = %item.name, "Claim session opened");

        Ok(Self {
            inner: Arc::new(SessionInner {
                item,
                device,
                readiness,
                directory: services.directory.clone(),
                endpoint: services.endpoint.clone(),
                state: Mutex::new(SessionState::default()),
            }),
            poller,
        })
    }

    pub fn item(&self) -> &ItemReference {
        &self.inner.item
    }

    pub fn readiness(&self) -> ReadinessSignal {
        self.inner.readiness.current()
    }

    pub fn subscribe_readiness(&self) -> watch::Receiver<ReadinessSignal> {
        self.inner.readiness.subscribe()
    }

    pub fn device_state(&self) -> DeviceState {
        self.inner.device.state()
    }

    pub fn evidence(&self) -> Option<Evidence> {
        self.inner.lock().gate.evidence().cloned()
    }

    pub fn claimant_identifier(&self) -> String {
        self.inner.lock().claimant_identifier.clone()
    }

    pub fn claimant_name(&self) -> Option<String> {
        self.inner.lock().claimant_name.clone()
    }

    /// `None` until the first submission is dispatched.
    pub fn outcome(&self) -> Option<ClaimOutcome> {
        self.inner.lock().guard.outcome().cloned()
    }

    pub fn receipt(&self) -> Option<ReceiptView> {
        self.inner.lock().receipt.clone()
    }

    pub fn is_in_progress(&self) -> bool {
        self.inner.lock().guard.in_progress()
    }

    pub fn has_succeeded(&self) -> bool {
        self.inner.lock().guard.succeeded()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    pub fn polling_stopped(&self) -> bool {
        self.poller.is_finished()
    }

    /// Records the student number and returns the matching display name.
    ///
    /// An unknown number is still recorded, so the operator can keep typing.
    pub fn set_claimant(&self, identifier: &str) -> Result<String, ClaimError> {
        let mut state = self.inner.lock();
        if state.cancelled {
            return Err(ClaimError::Cancelled);
        }
        state.guard.check_idle()?;

        let identifier = identifier.trim().to_string();
        let name = self.inner.directory.resolve(&identifier);

        state.claimant_identifier = identifier.clone();
        state.claimant_name = name.clone();

        name.ok_or(ClaimError::IdentityNotFound(identifier))
    }

    pub fn capture(&self) -> Result<Evidence, ClaimError> {
        let mut state = self.inner.lock();
        if state.cancelled {
            return Err(ClaimError::Cancelled);
        }

        let evidence = state
            .gate
            .fire(&self.inner.readiness, &self.inner.device)?;
        self.poller.cancel();

        Ok(evidence)
    }

    /// Sends the claim. Rejections leave the session untouched.
    ///
    /// The request runs in its own task, so dropping this future does not
    /// abort it and its result is still recorded.
    pub async fn submit(&self) -> Result<ClaimOutcome, ClaimError> {
        let (dispatch, request) = {
            let mut state = self.inner.lock();
            if state.cancelled {
                return Err(ClaimError::Cancelled);
            }
            state.guard.check_idle()?;

            let evidence = state
                .gate
                .evidence()
                .cloned()
                .ok_or(ClaimError::EvidenceMissing)?;

            let identifier = state.claimant_identifier.clone();
            let name = self
                .inner
                .directory
                .resolve(&identifier)
                .ok_or_else(|| ClaimError::IdentityNotFound(identifier.clone()))?;
            state.claimant_name = Some(name.clone());

            let dispatch = state.guard.try_begin()?;
            let request = ClaimRequest {
                claimant_identifier: identifier,
                claimant_name: name,
                evidence,
            };

            (dispatch, request)
        };

        info!(
            item_id = self.inner.item.id,
            attempt = dispatch.attempt,
            "Submitting claim"
        );

        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let result = inner.endpoint.submit_claim(&inner.item, &request).await;
            inner.complete(dispatch, request, result)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Claim task failed: {e}");
                let mut state = self.inner.lock();
                match state.guard.complete_failure(dispatch, e.to_string()) {
                    Resolution::Failed(reason) => Ok(ClaimOutcome::Failure(reason)),
                    _ => Ok(state
                        .guard
                        .outcome()
                        .cloned()
                        .unwrap_or(ClaimOutcome::Pending)),
                }
            }
        }
    }

    /// Stops polling and closes the camera. Safe to call more than once.
    pub fn cancel(&self) {
        let mut state = self.inner.lock();
        if !state.cancelled && !state.guard.succeeded() {
            state.cancelled = true;
            info!(item_id = self.inner.item.id, "Claim session cancelled");
        }
        drop(state);

        self.inner.readiness.freeze();
        self.poller.cancel();
        self.inner.device.release();
    }
}

impl Drop for ClaimSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
