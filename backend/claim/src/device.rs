//! # Capture Device Manager
//!
//! Owns the live camera feed for one claim session.
//!
//! ## Contract
//!
//! - `acquire` opens the feed or fails with `DeviceUnavailable`
//! - `current_frame` is a snapshot of the newest frame, it never blocks
//! - `release` stops the feed; calling it again is a no-op
//!
//! ## Implementation
//!
//! - The frame source sits behind a lock in an `Option`
//! - Release takes it out, so `stop` runs exactly once per acquisition
//! - Dropping the device releases it, the feed can't leak past the session
use std::{
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::Error;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::ClaimError;

/// One still image from the feed, already encoded by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
    pub content_type: String,
}

impl Frame {
    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: "image/jpeg".to_string(),
        }
    }
}

/// A running feed. Implementors keep producing frames until `stop`.
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self) -> Option<Frame>;

    fn stop(&mut self);
}

/// Something that can open a feed, such as a webcam or a folder of stills.
pub trait CaptureBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Open,
    Closed,
}

pub struct CaptureDevice {
    source: Mutex<Option<Box<dyn FrameSource>>>,
}

impl CaptureDevice {
    pub fn acquire(backend: &dyn CaptureBackend) -> Result<Self, ClaimError> {
        let source = backend.open().map_err(|e| {
            warn!("Camera access denied: {e:#}");
            ClaimError::DeviceUnavailable(format!("{e:#}"))
        })?;

        info!("Capture device opened");

        Ok(Self {
            source: Mutex::new(Some(source)),
        })
    }

    pub fn current_frame(&self) -> Option<Frame> {
        self.lock().as_ref().and_then(|source| source.latest_frame())
    }

    pub fn state(&self) -> DeviceState {
        match self.lock().is_some() {
            true => DeviceState::Open,
            false => DeviceState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == DeviceState::Open
    }

    /// Returns `true` only for the call that actually closed the feed.
    pub fn release(&self) -> bool {
        let Some(mut source) = self.lock().take() else {
            debug!("Capture device already released");
            return false;
        };

        source.stop();
        info!("Capture device released");

        true
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn FrameSource>>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureDevice")
            .field("state", &self.state())
            .finish()
    }
}
