//! Advisory availability checking for the booking form. While the user
//! adjusts date or times, the form fires an overlap query per change; only
//! the most recent query may settle the indicator, and a failed query
//! settles optimistically because the submit-time check is the real gate.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::StoreError;

/// Tri-state availability indicator shown next to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryStatus {
    /// A check is in flight; submission should be held back.
    Checking,
    Conflict,
    Clear,
}

/// Handle identifying one in-flight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket(u64);

/// Serializes advisory checks: each `begin` invalidates every earlier
/// ticket, so a slow response for stale inputs can never overwrite the
/// indicator for the current ones.
pub struct AdvisoryChecker {
    seq: AtomicU64,
}

impl AdvisoryChecker {
    pub fn new() -> Self {
        Self { seq: AtomicU64::new(0) }
    }

    /// Start a new check, invalidating all previous tickets. The caller
    /// should show `Checking` until the matching `settle`.
    pub fn begin(&self) -> CheckTicket {
        CheckTicket(self.seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: &CheckTicket) -> bool {
        self.seq.load(Ordering::SeqCst) == ticket.0
    }

    /// Resolve a finished check. Stale tickets are discarded (`None`).
    /// A store failure settles as `Clear`: the advisory signal is a
    /// convenience and must not block the form when the backend hiccups.
    pub fn settle(
        &self,
        ticket: CheckTicket,
        outcome: Result<bool, StoreError>,
    ) -> Option<AdvisoryStatus> {
        if !self.is_current(&ticket) {
            return None;
        }
        Some(match outcome {
            Ok(true) => AdvisoryStatus::Conflict,
            Ok(false) | Err(_) => AdvisoryStatus::Clear,
        })
    }
}

impl Default for AdvisoryChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_shows_checking_until_settle() {
        let checker = AdvisoryChecker::new();
        // The form flips the indicator to Checking the moment a check
        // starts and holds it there until its own ticket settles.
        let ticket = checker.begin();
        let mut indicator = AdvisoryStatus::Checking;
        assert!(checker.is_current(&ticket));
        assert_eq!(indicator, AdvisoryStatus::Checking);

        if let Some(settled) = checker.settle(ticket, Ok(true)) {
            indicator = settled;
        }
        assert_eq!(indicator, AdvisoryStatus::Conflict);

        // A stale settle leaves the indicator untouched.
        let old = checker.begin();
        let _ = checker.begin();
        if let Some(settled) = checker.settle(old, Ok(false)) {
            indicator = settled;
        }
        assert_eq!(indicator, AdvisoryStatus::Conflict);
    }

    #[test]
    fn current_check_settles() {
        let checker = AdvisoryChecker::new();
        let ticket = checker.begin();
        assert_eq!(checker.settle(ticket, Ok(true)), Some(AdvisoryStatus::Conflict));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let checker = AdvisoryChecker::new();
        let old = checker.begin();
        let new = checker.begin();
        assert!(!checker.is_current(&old));
        assert_eq!(checker.settle(old, Ok(true)), None);
        assert_eq!(checker.settle(new, Ok(false)), Some(AdvisoryStatus::Clear));
    }

    #[test]
    fn store_failure_settles_clear() {
        let checker = AdvisoryChecker::new();
        let ticket = checker.begin();
        let outcome = Err(StoreError::Unavailable("timeout".into()));
        assert_eq!(checker.settle(ticket, outcome), Some(AdvisoryStatus::Clear));
    }
}
