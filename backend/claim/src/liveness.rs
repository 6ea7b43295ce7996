//! # Liveness Poller
//!
//! Keeps the readiness signal in step with the face detector while the
//! camera is open.
//!
//! ## Loop
//!
//! Every tick, in order:
//! 1. Stop if the readiness cell is frozen (evidence captured or session cancelled) or the camera closed
//! 2. Detector still loading: sleep the backoff (500ms) and try again, no detection attempt is spent
//! 3. Run the detector on the current frame, present means `Ready`, absent means `NotReady`
//! 4. A detector error counts as absent for that tick and is only logged
//!
//! Then sleep the poll interval (100ms).
//!
//! ## Manual Override
//!
//! A one-shot timer (5s from camera open) forces `TimedOutManualOverride` if
//! nothing was captured and no face is currently seen. The override latches:
//! later ticks that see no face keep reporting the override instead of
//! taking manual capture away from the operator again.
//!
//! ## Freezing
//!
//! The cell checks the freeze flag under the same lock it writes under, so a
//! tick that was mid-detection when the capture landed can't touch the signal.
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Error;
use async_trait::async_trait;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Duration, sleep},
};
use tracing::{debug, info};

use crate::{
    device::{CaptureDevice, Frame},
    session::SessionConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessSignal {
    NotReady,
    Ready,
    TimedOutManualOverride,
}

impl ReadinessSignal {
    pub fn permits_capture(self) -> bool {
        matches!(self, Self::Ready | Self::TimedOutManualOverride)
    }

    /// Text for the capture button.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotReady => "LOOK AT CAMERA",
            Self::Ready => "CAPTURE FACE ID",
            Self::TimedOutManualOverride => "MANUAL CAPTURE (AI TIMEOUT)",
        }
    }
}

impl fmt::Display for ReadinessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Face detection model. Treated as a black box that answers present/absent.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Whether the model has finished loading.
    fn is_ready(&self) -> bool {
        true
    }

    async fn detect(&self, frame: &Frame) -> Result<bool, Error>;
}

/// For hosts that ship without a model. Capture opens up via the manual override.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDetector;

#[async_trait]
impl Detector for UnavailableDetector {
    fn is_ready(&self) -> bool {
        false
    }

    async fn detect(&self, _frame: &Frame) -> Result<bool, Error> {
        Ok(false)
    }
}

#[derive(Debug)]
struct CellState {
    signal: ReadinessSignal,
    frozen: bool,
    override_latched: bool,
}

#[derive(Debug)]
pub struct ReadinessCell {
    state: Mutex<CellState>,
    notify: watch::Sender<ReadinessSignal>,
}

impl Default for ReadinessCell {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessCell {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(ReadinessSignal::NotReady);

        Self {
            state: Mutex::new(CellState {
                signal: ReadinessSignal::NotReady,
                frozen: false,
                override_latched: false,
            }),
            notify,
        }
    }

    pub fn current(&self) -> ReadinessSignal {
        self.lock().signal
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessSignal> {
        self.notify.subscribe()
    }

    pub fn is_frozen(&self) -> bool {
        self.lock().frozen
    }

    /// Applies one detector reading. Returns `false` once frozen.
    pub fn observe(&self, detected: bool) -> bool {
        let mut state = self.lock();
        if state.frozen {
            return false;
        }

        let next = match (detected, state.override_latched) {
            (true, _) => ReadinessSignal::Ready,
            (false, true) => ReadinessSignal::TimedOutManualOverride,
            (false, false) => ReadinessSignal::NotReady,
        };
        self.publish(&mut state, next);

        true
    }

    /// Returns `true` only if the override actually took effect.
    pub fn force_override(&self) -> bool {
        let mut state = self.lock();
        if state.frozen || state.override_latched || state.signal == ReadinessSignal::Ready {
            return false;
        }

        state.override_latched = true;
        self.publish(&mut state, ReadinessSignal::TimedOutManualOverride);

        true
    }

    /// Freezes the signal for a capture, if the current value allows one.
    pub(crate) fn freeze_for_capture(&self) -> Option<ReadinessSignal> {
        let mut state = self.lock();
        if state.frozen || !state.signal.permits_capture() {
            return None;
        }

        state.frozen = true;
        Some(state.signal)
    }

    pub fn freeze(&self) {
        self.lock().frozen = true;
    }

    fn publish(&self, state: &mut CellState, next: ReadinessSignal) {
        state.signal = next;
        self.notify.send_if_modified(|current| {
            if *current == next {
                return false;
            }

            *current = next;
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, CellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct LivenessPoller {
    detector: Arc<dyn Detector>,
    device: Arc<CaptureDevice>,
    readiness: Arc<ReadinessCell>,
    poll_interval: Duration,
    detector_backoff: Duration,
    manual_override_after: Duration,
}

impl LivenessPoller {
    pub fn new(
        detector: Arc<dyn Detector>,
        device: Arc<CaptureDevice>,
        readiness: Arc<ReadinessCell>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            detector,
            device,
            readiness,
            poll_interval: config.poll_interval,
            detector_backoff: config.detector_backoff,
            manual_override_after: config.manual_override_after,
        }
    }

    /// Starts the tick loop and the override timer. Must run inside a tokio runtime.
    pub fn spawn(self) -> PollerHandle {
        let timer = tokio::spawn(override_after(
            self.readiness.clone(),
            self.manual_override_after,
        ));
        let ticks = tokio::spawn(self.run());

        PollerHandle { ticks, timer }
    }

    async fn run(self) {
        let mut ticks = 0u64;

        loop {
            if self.readiness.is_frozen() || !self.device.is_open() {
                break;
            }

            if !self.detector.is_ready() {
                sleep(self.detector_backoff).await;
                continue;
            }

            let detected = self.detect().await;
            ticks += 1;

            if !self.readiness.observe(detected) {
                break;
            }

            sleep(self.poll_interval).await;
        }

        debug!(ticks, "Liveness polling stopped");
    }

    async fn detect(&self) -> bool {
        let Some(frame) = self.device.current_frame() else {
            return false;
        };

        match self.detector.detect(&frame).await {
            Ok(detected) => detected,
            Err(e) => {
                debug!("Detection failed, treating as absent: {e:#}");
                false
            }
        }
    }
}

async fn override_after(readiness: Arc<ReadinessCell>, delay: Duration) {
    sleep(delay).await;

    if readiness.force_override() {
        info!(?delay, "Detector timed out, manual capture allowed");
    }
}

/// Cancels both poller tasks when cancelled or dropped.
pub struct PollerHandle {
    ticks: JoinHandle<()>,
    timer: JoinHandle<()>,
}

impl PollerHandle {
    pub fn cancel(&self) {
        self.ticks.abort();
        self.timer.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.ticks.is_finished() && self.timer.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
