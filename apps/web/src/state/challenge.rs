//! The single outstanding OTP challenge for this process.
//!
//! There is one session per process, so there is one challenge slot. A new
//! request replaces the old challenge; a successful verify clears it. The
//! code never leaves memory.

use hopline_core::identity::OtpChallenge;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct ChallengeState {
    slot: Arc<Mutex<Option<OtpChallenge>>>,
}

impl ChallengeState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OtpChallenge>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Option<OtpChallenge> {
        self.lock().clone()
    }

    /// Replaces any pending challenge.
    pub fn issue(&self, challenge: OtpChallenge) {
        *self.lock() = Some(challenge);
    }

    /// Removes the pending challenge if it is still `challenge`. A
    /// challenge issued in the meantime is kept.
    pub fn consume(&self, challenge: &OtpChallenge) -> bool {
        let mut slot = self.lock();
        if slot.as_ref() == Some(challenge) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hopline_core::identity::ChallengePurpose;

    #[test]
    fn test_issue_replace_consume() {
        let state = ChallengeState::new();
        assert!(state.current().is_none());

        let first = OtpChallenge::new("a@example.com", "1111", ChallengePurpose::Login, Utc::now(), true);
        let second = OtpChallenge::new("b@example.com", "2222", ChallengePurpose::Login, Utc::now(), true);

        state.issue(first.clone());
        state.issue(second.clone());
        assert_eq!(state.current().unwrap().email, "b@example.com");

        assert!(!state.consume(&first));
        assert!(state.consume(&second));
        assert!(state.current().is_none());
    }
}
