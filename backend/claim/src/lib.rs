//! # Claim Capture
//!
//! Face ID capture and claim submission for the lost-and-found desk.
//!
//! ## Components
//!
//! Leaf first, data flows down the list and back to the device at the end:
//! - [`device`]: live camera feed, frame snapshots, release exactly once
//! - [`liveness`]: detector polling loop, readiness signal, 5s manual override
//! - [`gate`]: one capture per session, frame becomes evidence
//! - [`guard`]: one submission in flight, success beats a racing failure
//! - [`receipt`]: confirmation view, closes the camera on success
//! - [`session`]: ties the above together for one item
//! - [`remote`]: the HTTP claim endpoint
//!
//! ## Scheduling
//!
//! Poll ticks, the override timer and the claim request are tokio tasks.
//! Nothing relies on parallelism, every shared value sits behind a short
//! lock that is never held across an await.
//!
//! ## Errors
//!
//! | Error | Meaning | Recovery |
//! |-------|---------|----------|
//! | `DeviceUnavailable` | camera could not be opened | new session |
//! | `NotReady` / `AlreadyCaptured` | capture out of order | wait, or new session |
//! | `IdentityNotFound` | student number unknown | fix the input |
//! | `Failure` outcome | claim request failed | submit again |
//!
//! Detector errors never leave the poller. A failure that loses the race to
//! a success is dropped silently.
pub mod device;
pub mod error;
pub mod gate;
pub mod guard;
pub mod liveness;
pub mod receipt;
pub mod remote;
pub mod session;

pub use device::{CaptureBackend, CaptureDevice, DeviceState, Frame, FrameSource};
pub use error::{ClaimError, EndpointError};
pub use gate::Evidence;
pub use guard::{ClaimOutcome, ClaimSuccess};
pub use liveness::{Detector, ReadinessSignal, UnavailableDetector};
pub use receipt::ReceiptView;
pub use remote::{ClaimAck, ClaimEndpoint, ClaimRequest, HttpClaimEndpoint};
pub use session::{ClaimServices, ClaimSession, IdentityLookup, ItemReference, SessionConfig};
