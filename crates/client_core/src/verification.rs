//! Email verification: the code-send call and the session state machine
//! (Idle -> CodeSent -> Expired, with Verified reachable from either).

use std::sync::Arc;

use serde::Serialize;
use shared::{
    error::BackendError,
    protocol::{SendVerificationCodeRequest, SendVerificationCodeResponse, VERIFICATION_SEND_PATH},
};

use crate::transport::{encode_body, SignupTransport};

#[derive(Clone)]
pub struct VerificationCodeSender {
    transport: Arc<dyn SignupTransport>,
}

impl VerificationCodeSender {
    pub fn new(transport: Arc<dyn SignupTransport>) -> Self {
        Self { transport }
    }

    /// Returns the code the backend expects the user to enter.
    pub async fn send(&self, email: &str) -> Result<String, BackendError> {
        let body = encode_body(&SendVerificationCodeRequest {
            email: email.to_string(),
        })?;
        let res = self
            .transport
            .post_json(VERIFICATION_SEND_PATH, body)
            .await?;
        if !res.is_success() {
            return Err(BackendError::UnexpectedStatus(res.status));
        }
        let body: SendVerificationCodeResponse = res.decode()?;
        Ok(body.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPhase {
    #[default]
    Idle,
    CodeSent,
    Expired,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    pub sent: bool,
    pub code_input_visible: bool,
    pub remaining_seconds: u32,
    pub entered_code: String,
    pub verified: bool,
}

impl VerificationSession {
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            sent: false,
            code_input_visible: false,
            remaining_seconds: duration_seconds,
            entered_code: String::new(),
            verified: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Ignored,
    Counting,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    Verified,
    Mismatch,
    NotRequested,
    AlreadyVerified,
}

#[derive(Debug)]
pub(crate) struct VerificationFlow {
    session: VerificationSession,
    phase: VerificationPhase,
    expected_code: Option<String>,
    generation: u64,
    request_in_flight: bool,
    duration_seconds: u32,
}

impl VerificationFlow {
    pub(crate) fn new(duration_seconds: u32) -> Self {
        Self {
            session: VerificationSession::new(duration_seconds),
            phase: VerificationPhase::Idle,
            expected_code: None,
            generation: 0,
            request_in_flight: false,
            duration_seconds,
        }
    }

    pub(crate) fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub(crate) fn phase(&self) -> VerificationPhase {
        self.phase
    }

    pub(crate) fn can_request(&self) -> bool {
        !self.request_in_flight && self.phase != VerificationPhase::Verified
    }

    pub(crate) fn mark_requested(&mut self) {
        self.request_in_flight = true;
    }

    pub(crate) fn request_failed(&mut self) {
        self.request_in_flight = false;
    }

    /// Enters CodeSent with a full countdown; returns the generation that
    /// ticks must carry to be accepted.
    pub(crate) fn begin(&mut self, expected_code: String) -> u64 {
        self.request_in_flight = false;
        self.generation += 1;
        self.expected_code = Some(expected_code);
        self.phase = VerificationPhase::CodeSent;
        self.session.sent = true;
        self.session.code_input_visible = true;
        self.session.remaining_seconds = self.duration_seconds;
        self.generation
    }

    pub(crate) fn apply_tick(&mut self, generation: u64, remaining: u32) -> TickOutcome {
        if generation != self.generation || self.phase != VerificationPhase::CodeSent {
            return TickOutcome::Ignored;
        }
        self.session.remaining_seconds = remaining.min(self.session.remaining_seconds);
        if self.session.remaining_seconds == 0 {
            self.phase = VerificationPhase::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Counting
        }
    }

    pub(crate) fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.phase != VerificationPhase::CodeSent {
            return false;
        }
        self.session.remaining_seconds = 0;
        self.phase = VerificationPhase::Expired;
        true
    }

    pub(crate) fn set_entered(&mut self, code: String) {
        self.session.entered_code = code;
    }

    pub(crate) fn submit(&mut self) -> SubmitOutcome {
        match self.phase {
            VerificationPhase::Idle => SubmitOutcome::NotRequested,
            VerificationPhase::Verified => SubmitOutcome::AlreadyVerified,
            VerificationPhase::CodeSent | VerificationPhase::Expired => {
                if self.expected_code.as_deref() == Some(self.session.entered_code.as_str()) {
                    self.phase = VerificationPhase::Verified;
                    self.session.verified = true;
                    SubmitOutcome::Verified
                } else {
                    SubmitOutcome::Mismatch
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_shows_input_and_resets_countdown() {
        let mut flow = VerificationFlow::new(180);
        assert_eq!(flow.phase(), VerificationPhase::Idle);
        let generation = flow.begin("123456".into());
        assert_eq!(flow.phase(), VerificationPhase::CodeSent);
        assert!(flow.session().sent && flow.session().code_input_visible);
        assert_eq!(flow.session().remaining_seconds, 180);

        assert_eq!(flow.apply_tick(generation, 179), TickOutcome::Counting);
        let restarted = flow.begin("654321".into());
        assert_ne!(restarted, generation);
        assert_eq!(flow.session().remaining_seconds, 180);
    }

    #[test]
    fn ticks_from_older_generations_are_ignored() {
        let mut flow = VerificationFlow::new(10);
        let first = flow.begin("1".into());
        let second = flow.begin("2".into());
        assert_eq!(flow.apply_tick(first, 3), TickOutcome::Ignored);
        assert_eq!(flow.session().remaining_seconds, 10);
        assert_eq!(flow.apply_tick(second, 9), TickOutcome::Counting);
        assert!(!flow.expire(first));
    }

    #[test]
    fn reaching_zero_expires_and_further_ticks_are_noops() {
        let mut flow = VerificationFlow::new(2);
        let generation = flow.begin("1".into());
        assert_eq!(flow.apply_tick(generation, 1), TickOutcome::Counting);
        assert_eq!(flow.apply_tick(generation, 0), TickOutcome::Expired);
        assert_eq!(flow.phase(), VerificationPhase::Expired);
        assert_eq!(flow.apply_tick(generation, 0), TickOutcome::Ignored);
        assert!(!flow.expire(generation));
        assert!(flow.session().code_input_visible);
    }

    #[test]
    fn submit_compares_against_expected_code() {
        let mut flow = VerificationFlow::new(180);
        assert_eq!(flow.submit(), SubmitOutcome::NotRequested);

        flow.begin("424242".into());
        flow.set_entered("000000".into());
        assert_eq!(flow.submit(), SubmitOutcome::Mismatch);
        assert!(!flow.session().verified);

        flow.set_entered("424242".into());
        assert_eq!(flow.submit(), SubmitOutcome::Verified);
        assert!(flow.session().verified);
        assert_eq!(flow.submit(), SubmitOutcome::AlreadyVerified);
        assert!(!flow.can_request());
    }

    #[test]
    fn expired_session_still_accepts_the_right_code() {
        let mut flow = VerificationFlow::new(1);
        let generation = flow.begin("7".into());
        assert!(flow.expire(generation));
        flow.set_entered("7".into());
        assert_eq!(flow.submit(), SubmitOutcome::Verified);
    }

    #[test]
    fn in_flight_request_blocks_another() {
        let mut flow = VerificationFlow::new(180);
        assert!(flow.can_request());
        flow.mark_requested();
        assert!(!flow.can_request());
        flow.request_failed();
        assert!(flow.can_request());
    }
}
