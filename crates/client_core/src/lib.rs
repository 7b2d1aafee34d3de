//! Signup form engine: field rules, remote uniqueness checks, and the email
//! verification countdown, driven by a single-owner controller.

pub mod config;
pub mod controller;
mod fields;
pub mod messages;
pub mod state;
pub mod timer;
pub mod transport;
pub mod uniqueness;
pub mod verification;

pub use config::{load_settings, FormRules, Settings};
pub use controller::{SignupCommand, SignupFormController};
pub use state::{ErrorMap, Feedback, FeedbackMap, FormSnapshot, FormValues};
pub use timer::VerificationTimer;
pub use transport::{HttpTransport, MissingTransport, SignupTransport, TransportResponse};
pub use uniqueness::UniquenessChecker;
pub use verification::{VerificationCodeSender, VerificationPhase, VerificationSession};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
