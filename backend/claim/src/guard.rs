//! # Submission Guard
//!
//! Bookkeeping for claim submissions, kept free of any network code so the
//! race rules can be tested on their own.
//!
//! ## Flags
//!
//! - `in_progress`: a request is out, no second dispatch is allowed
//! - `succeeded`: monotonic, never goes back to `false`
//!
//! ## Completion Rules
//!
//! - Success always lands unless a success already did, even if a failure
//!   for the same dispatch was recorded first
//! - Failure is discarded when a success was already observed, or when it
//!   belongs to an older dispatch than the one in flight
//! - Applied failure clears `in_progress` and leaves everything else, so the
//!   operator can retry without recapturing
//!
//! A transport error can arrive after the server already recorded the claim.
//! Trusting it over a success would let the operator retry and claim twice.
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{error::ClaimError, session::ItemReference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSuccess {
    /// Server-issued id. Absent when the server recorded the claim but its reply was unreadable.
    pub claim_id: Option<String>,
    pub item: ItemReference,
    pub claimant_identifier: String,
    pub claimant_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Pending,
    Success(ClaimSuccess),
    Failure(String),
}

impl ClaimOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Ticket for one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Succeeded(ClaimSuccess),
    Failed(String),
    /// Completion ignored. Never shown to the operator.
    RaceDiscarded,
}

#[derive(Debug, Default)]
pub struct SubmissionGuard {
    in_progress: bool,
    succeeded: bool,
    attempts: u32,
    outcome: Option<ClaimOutcome>,
}

impl SubmissionGuard {
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// `None` until the first dispatch.
    pub fn outcome(&self) -> Option<&ClaimOutcome> {
        self.outcome.as_ref()
    }

    pub fn check_idle(&self) -> Result<(), ClaimError> {
        if self.succeeded {
            return Err(ClaimError::AlreadySucceeded);
        }

        if self.in_progress {
            return Err(ClaimError::InProgress);
        }

        Ok(())
    }

    pub fn try_begin(&mut self) -> Result<Dispatch, ClaimError> {
        self.check_idle()?;

        self.in_progress = true;
        self.attempts += 1;
        self.outcome = Some(ClaimOutcome::Pending);

        Ok(Dispatch {
            attempt: self.attempts,
        })
    }

    pub fn complete_success(&mut self, dispatch: Dispatch, success: ClaimSuccess) -> Resolution {
        if self.succeeded {
            debug!(attempt = dispatch.attempt, "Duplicate success discarded");
            return Resolution::RaceDiscarded;
        }

        self.succeeded = true;
        self.in_progress = false;
        self.outcome = Some(ClaimOutcome::Success(success.clone()));

        info!(
            attempt = dispatch.attempt,
            claim_id = success.claim_id.as_deref().unwrap_or("N/A"),
            "Claim succeeded"
        );

        Resolution::Succeeded(success)
    }

    pub fn complete_failure(&mut self, dispatch: Dispatch, reason: String) -> Resolution {
        if self.succeeded {
            debug!(attempt = dispatch.attempt, %reason, "Failure after success discarded");
            return Resolution::RaceDiscarded;
        }

        if dispatch.attempt != self.attempts {
            debug!(
                attempt = dispatch.attempt,
                current = self.attempts,
                "Failure for a stale dispatch discarded"
            );
            return Resolution::RaceDiscarded;
        }

        self.in_progress = false;
        self.outcome = Some(ClaimOutcome::Failure(reason.clone()));

        warn!(attempt = dispatch.attempt, %reason, "Claim failed");

        Resolution::Failed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(claim_id: &str) -> ClaimSuccess {
        ClaimSuccess {
            claim_id: Some(claim_id.to_string()),
            item: ItemReference {
                id: 4,
                name: "Calculator".to_string(),
                location: "Library".to_string(),
            },
            claimant_identifier: "2021001".to_string(),
            claimant_name: "Ana Reyes".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_single_dispatch_while_in_progress() {
        let mut guard = SubmissionGuard::default();
        guard.try_begin().unwrap();

        assert_eq!(guard.try_begin(), Err(ClaimError::InProgress));
        assert_eq!(guard.attempts(), 1);
        assert_eq!(guard.outcome(), Some(&ClaimOutcome::Pending));
    }

    #[test]
    fn test_success_then_failure_keeps_success() {
        let mut guard = SubmissionGuard::default();
        let dispatch = guard.try_begin().unwrap();

        assert!(matches!(
            guard.complete_success(dispatch, success("C-100")),
            Resolution::Succeeded(_)
        ));
        assert_eq!(
            guard.complete_failure(dispatch, "connection reset".to_string()),
            Resolution::RaceDiscarded
        );

        assert!(guard.succeeded());
        assert!(!guard.in_progress());
        assert!(guard.outcome().unwrap().is_success());
    }

    #[test]
    fn test_failure_then_success_success_wins() {
        let mut guard = SubmissionGuard::default();
        let dispatch = guard.try_begin().unwrap();

        assert_eq!(
            guard.complete_failure(dispatch, "timeout".to_string()),
            Resolution::Failed("timeout".to_string())
        );
        assert!(matches!(
            guard.complete_success(dispatch, success("C-101")),
            Resolution::Succeeded(_)
        ));

        assert!(guard.succeeded());
        match guard.outcome() {
            Some(ClaimOutcome::Success(s)) => assert_eq!(s.claim_id.as_deref(), Some("C-101")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_succeeded_is_terminal() {
        let mut guard = SubmissionGuard::default();
        let dispatch = guard.try_begin().unwrap();
        guard.complete_success(dispatch, success("C-100"));

        assert_eq!(guard.try_begin(), Err(ClaimError::AlreadySucceeded));
        assert_eq!(
            guard.complete_success(dispatch, success("C-999")),
            Resolution::RaceDiscarded
        );
        match guard.outcome() {
            Some(ClaimOutcome::Success(s)) => assert_eq!(s.claim_id.as_deref(), Some("C-100")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_failure_allows_retry() {
        let mut guard = SubmissionGuard::default();
        let first = guard.try_begin().unwrap();
        guard.complete_failure(first, "503".to_string());

        assert!(!guard.in_progress());
        let second = guard.try_begin().unwrap();
        assert_eq!(second.attempt, 2);
    }

    #[test]
    fn test_stale_failure_does_not_unlock_newer_dispatch() {
        let mut guard = SubmissionGuard::default();
        let first = guard.try_begin().unwrap();
        guard.complete_failure(first, "reset".to_string());
        let _second = guard.try_begin().unwrap();

        assert_eq!(
            guard.complete_failure(first, "late reset".to_string()),
            Resolution::RaceDiscarded
        );
        assert!(guard.in_progress());
    }
}
