//! Single-owner signup state machine. Commands are applied synchronously;
//! network responses and countdown ticks come back as completions on a
//! channel that the owning event loop drains with [`SignupFormController::next_completion`].

use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{ErrorKey, Field, IdentifierKind, UniquenessResult},
    error::BackendError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::FormRules,
    fields::{rule_for, rules as field_rules, Rule},
    messages,
    state::{ErrorMap, FeedbackMap, FormSnapshot, FormValues},
    timer::VerificationTimer,
    transport::SignupTransport,
    uniqueness::UniquenessChecker,
    verification::{SubmitOutcome, TickOutcome, VerificationCodeSender, VerificationFlow},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupCommand {
    Edit { field: Field, value: String },
    Blur { field: Field, value: String },
    RequestCode,
    EditCode(String),
    SubmitCode,
    ToggleAgree(bool),
}

impl SignupCommand {
    fn name(&self) -> &'static str {
        match self {
            SignupCommand::Edit { .. } => "edit",
            SignupCommand::Blur { .. } => "blur",
            SignupCommand::RequestCode => "request_code",
            SignupCommand::EditCode(_) => "edit_code",
            SignupCommand::SubmitCode => "submit_code",
            SignupCommand::ToggleAgree(_) => "toggle_agree",
        }
    }
}

#[derive(Debug)]
enum Completion {
    Uniqueness {
        field: Field,
        seq: u64,
        value: String,
        result: UniquenessResult,
    },
    CodeSent {
        email: String,
        outcome: Result<String, BackendError>,
    },
    Tick {
        generation: u64,
        remaining: u32,
    },
    Expired {
        generation: u64,
    },
}

/// Bookkeeping for the latest uniqueness check issued for one field.
#[derive(Debug, Default)]
struct CheckTracker {
    latest_seq: u64,
    value: String,
    in_flight: bool,
    outcome: Option<UniquenessResult>,
}

impl CheckTracker {
    fn confirms_available(&self, value: &str) -> bool {
        !self.in_flight && self.outcome == Some(UniquenessResult::Available) && self.value == value
    }

    fn already_covers(&self, value: &str) -> bool {
        self.value == value
            && (self.in_flight
                || matches!(
                    self.outcome,
                    Some(UniquenessResult::Available | UniquenessResult::Taken)
                ))
    }

    fn invalidate(&mut self) {
        self.latest_seq += 1;
        self.value.clear();
        self.in_flight = false;
        self.outcome = None;
    }
}

struct FormState {
    values: FormValues,
    errors: ErrorMap,
    feedback: FeedbackMap,
    agreed: bool,
    verification: VerificationFlow,
    checks: HashMap<Field, CheckTracker>,
}

impl FormState {
    fn new(rules: &FormRules) -> Self {
        Self {
            values: FormValues::default(),
            errors: ErrorMap::default(),
            feedback: FeedbackMap::default(),
            agreed: false,
            verification: VerificationFlow::new(rules.verification_seconds),
            checks: HashMap::new(),
        }
    }

    fn is_email_valid(&self) -> bool {
        self.checks
            .get(&Field::Email)
            .is_some_and(|tracker| tracker.confirms_available(&self.values.email))
    }

    fn checking_email(&self) -> bool {
        self.checks
            .get(&Field::Email)
            .is_some_and(|tracker| tracker.in_flight)
    }

    fn can_submit(&self, rules: &FormRules) -> bool {
        self.errors.is_clear()
            && field_rules()
                .iter()
                .filter(|rule| rule.required)
                .all(|rule| !self.values.get(rule.field).is_empty())
            && self.agreed
            && (!rules.require_verification || self.verification.session().verified)
    }
}

pub struct SignupFormController {
    rules: FormRules,
    state: FormState,
    checker: UniquenessChecker,
    code_sender: VerificationCodeSender,
    timer: Option<VerificationTimer>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    torn_down: bool,
}

impl SignupFormController {
    pub fn new(transport: Arc<dyn SignupTransport>, rules: FormRules) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: FormState::new(&rules),
            rules,
            checker: UniquenessChecker::new(transport.clone()),
            code_sender: VerificationCodeSender::new(transport),
            timer: None,
            completions_tx,
            completions_rx,
            torn_down: false,
        }
    }

    /// Applies one command. Remote calls and the countdown are spawned on
    /// the current tokio runtime; their results arrive as completions.
    ///
    /// # Panics
    ///
    /// Blurring an identifier field or requesting a code outside a tokio
    /// runtime panics, since both spawn a task.
    pub fn dispatch(&mut self, command: SignupCommand) {
        if self.torn_down {
            warn!(command = command.name(), "ignoring command after teardown");
            return;
        }
        debug!(command = command.name(), "dispatching signup command");
        match command {
            SignupCommand::Edit { field, value } => self.handle_edit(field, &value),
            SignupCommand::Blur { field, value } => self.handle_blur(field, &value),
            SignupCommand::RequestCode => self.handle_request_code(),
            SignupCommand::EditCode(code) => self.state.verification.set_entered(code),
            SignupCommand::SubmitCode => self.handle_submit_code(),
            SignupCommand::ToggleAgree(checked) => self.state.agreed = checked,
        }
    }

    pub fn on_field_change(&mut self, field: Field, raw_value: &str) {
        self.dispatch(SignupCommand::Edit {
            field,
            value: raw_value.to_string(),
        });
    }

    /// Validates `value` and, for identifier fields, starts a uniqueness check.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime when a uniqueness check is started.
    pub fn on_field_blur(&mut self, field: Field, value: &str) {
        self.dispatch(SignupCommand::Blur {
            field,
            value: value.to_string(),
        });
    }

    /// # Panics
    ///
    /// Panics outside a tokio runtime once the email is confirmed available.
    pub fn on_request_verification_code(&mut self) {
        self.dispatch(SignupCommand::RequestCode);
    }

    pub fn on_verification_code_change(&mut self, value: &str) {
        self.dispatch(SignupCommand::EditCode(value.to_string()));
    }

    pub fn on_verify_code(&mut self) {
        self.dispatch(SignupCommand::SubmitCode);
    }

    pub fn on_agree_toggle(&mut self, checked: bool) {
        self.dispatch(SignupCommand::ToggleAgree(checked));
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            values: self.state.values.clone(),
            errors: self.state.errors.clone(),
            feedback: self.state.feedback.clone(),
            is_email_valid: self.state.is_email_valid(),
            checking_email: self.state.checking_email(),
            agreed: self.state.agreed,
            verification: self.state.verification.session().clone(),
            phase: self.state.verification.phase(),
            can_submit: self.can_submit(),
        }
    }

    pub fn is_email_valid(&self) -> bool {
        self.state.is_email_valid()
    }

    pub fn can_submit(&self) -> bool {
        self.state.can_submit(&self.rules)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Waits for the next network response or countdown tick and applies it.
    /// Returns `false` once the controller has been torn down.
    pub async fn next_completion(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Applies every completion that is already queued without waiting.
    pub fn process_ready(&mut self) -> usize {
        let mut applied = 0;
        while !self.torn_down {
            match self.completions_rx.try_recv() {
                Ok(completion) => {
                    self.apply(completion);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        applied
    }

    /// Cancels the countdown without touching the session state.
    pub fn stop_verification(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
            debug!("verification countdown cancelled");
        }
    }

    /// Tears the controller down: the countdown stops and any response that
    /// arrives afterwards is dropped.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_verification();
        self.torn_down = true;
        self.completions_rx.close();
        info!("signup controller torn down");
    }

    fn handle_edit(&mut self, field: Field, raw: &str) {
        let rule = rule_for(field);
        let value = (rule.normalize)(raw);
        self.state.values.set(field, value);
        self.revalidate(field);
        for dependent in rule.dependents {
            self.revalidate(*dependent);
        }
    }

    fn revalidate(&mut self, field: Field) {
        if let Some(check) = rule_for(field).on_change {
            self.apply_verdict(field, check);
        }
    }

    fn apply_verdict(&mut self, field: Field, check: Rule) -> bool {
        let verdict = check(&self.state.values, &self.rules);
        let passed = verdict.error.is_empty();
        self.state.errors.set(field, verdict.error);
        if let Some(feedback) = verdict.feedback {
            self.state.feedback.set(field, feedback);
        }
        passed
    }

    fn handle_blur(&mut self, field: Field, raw: &str) {
        let rule = rule_for(field);
        let value = (rule.normalize)(raw);
        if self.state.values.get(field) != value {
            self.handle_edit(field, &value);
        }

        if let Some(check) = rule.on_blur {
            if !self.apply_verdict(field, check) {
                if let Some(tracker) = self.state.checks.get_mut(&field) {
                    tracker.invalidate();
                }
                return;
            }
        }

        if let Some(kind) = rule.uniqueness {
            self.issue_uniqueness_check(field, kind, value);
        }
    }

    fn issue_uniqueness_check(&mut self, field: Field, kind: IdentifierKind, value: String) {
        let tracker = self.state.checks.entry(field).or_default();
        if tracker.already_covers(&value) {
            debug!(%field, "value unchanged since last uniqueness check; not re-checking");
            if let Some(result) = tracker.outcome {
                self.state
                    .errors
                    .set(field, messages::uniqueness_error(kind, result));
            }
            return;
        }
        tracker.latest_seq += 1;
        tracker.value = value.clone();
        tracker.in_flight = true;
        tracker.outcome = None;
        let seq = tracker.latest_seq;

        let checker = self.checker.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = checker.check_unique(kind, &value).await;
            let _ = tx.send(Completion::Uniqueness {
                field,
                seq,
                value,
                result,
            });
        });
    }

    fn handle_request_code(&mut self) {
        if !self.state.is_email_valid() {
            debug!("verification code requested before email was confirmed available");
            return;
        }
        if !self.state.verification.can_request() {
            debug!("verification code request already in flight or session verified");
            return;
        }
        self.state.verification.mark_requested();

        let email = self.state.values.email.clone();
        let sender = self.code_sender.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = sender.send(&email).await;
            let _ = tx.send(Completion::CodeSent { email, outcome });
        });
    }

    fn handle_submit_code(&mut self) {
        match self.state.verification.submit() {
            SubmitOutcome::Verified => {
                self.state.errors.set(ErrorKey::VerificationCode, "");
                self.stop_verification();
                info!("email verified");
            }
            SubmitOutcome::Mismatch => {
                self.state
                    .errors
                    .set(ErrorKey::VerificationCode, messages::CODE_MISMATCH);
            }
            SubmitOutcome::NotRequested => {
                self.state
                    .errors
                    .set(ErrorKey::VerificationCode, messages::CODE_NOT_REQUESTED);
            }
            SubmitOutcome::AlreadyVerified => {}
        }
    }

    fn apply(&mut self, completion: Completion) {
        if self.torn_down {
            return;
        }
        match completion {
            Completion::Uniqueness {
                field,
                seq,
                value,
                result,
            } => self.apply_uniqueness(field, seq, value, result),
            Completion::CodeSent { email, outcome } => self.apply_code_sent(email, outcome),
            Completion::Tick {
                generation,
                remaining,
            } => {
                if self.state.verification.apply_tick(generation, remaining) == TickOutcome::Expired
                {
                    info!("verification code expired");
                    self.timer = None;
                }
            }
            Completion::Expired { generation } => {
                if self.state.verification.expire(generation) {
                    info!("verification code expired");
                }
                self.timer = None;
            }
        }
    }

    fn apply_uniqueness(&mut self, field: Field, seq: u64, value: String, result: UniquenessResult) {
        let current = self.state.values.get(field);
        let Some(tracker) = self.state.checks.get_mut(&field) else {
            return;
        };
        if tracker.latest_seq != seq {
            warn!(%field, seq, latest_seq = tracker.latest_seq, "discarding stale uniqueness response");
            return;
        }
        if current != value {
            warn!(%field, seq, "discarding uniqueness response for an edited value");
            tracker.in_flight = false;
            tracker.outcome = None;
            return;
        }
        tracker.in_flight = false;
        tracker.outcome = Some(result);
        let Some(kind) = rule_for(field).uniqueness else {
            return;
        };
        info!(%field, ?result, "uniqueness check resolved");
        self.state
            .errors
            .set(field, messages::uniqueness_error(kind, result));
    }

    fn apply_code_sent(&mut self, email: String, outcome: Result<String, BackendError>) {
        match outcome {
            Ok(code) => {
                if email != self.state.values.email {
                    warn!("verification code was sent to an email that has since changed");
                }
                let generation = self.state.verification.begin(code);
                self.state.errors.set(ErrorKey::VerificationCode, "");
                self.start_countdown(generation);
                info!(
                    seconds = self.rules.verification_seconds,
                    "verification code sent; countdown started"
                );
            }
            Err(error) => {
                self.state.verification.request_failed();
                self.state
                    .errors
                    .set(ErrorKey::VerificationCode, messages::CODE_SEND_FAILED);
                warn!(%error, "failed to send verification code");
            }
        }
    }

    fn start_countdown(&mut self, generation: u64) {
        self.stop_verification();
        let tick_tx = self.completions_tx.clone();
        let expire_tx = self.completions_tx.clone();
        self.timer = Some(VerificationTimer::start(
            self.rules.verification_seconds,
            self.rules.tick_period,
            move |remaining| {
                let _ = tick_tx.send(Completion::Tick {
                    generation,
                    remaining,
                });
            },
            move || {
                let _ = expire_tx.send(Completion::Expired { generation });
            },
        ));
    }
}

impl Drop for SignupFormController {
    fn drop(&mut self) {
        self.stop_verification();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
