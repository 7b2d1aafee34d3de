use std::sync::Arc;

use shared::{
    domain::{IdentifierKind, UniquenessResult},
    error::BackendError,
    protocol::{
        EmailCheckRequest, UsernameCheckRequest, UsernameCheckResponse, EMAIL_CHECK_PATH,
        USERNAME_CHECK_PATH,
    },
};
use tracing::warn;

use crate::transport::{encode_body, SignupTransport, TransportResponse};

const STATUS_OK: u16 = 200;
const STATUS_CONFLICT: u16 = 409;

/// Asks the backend whether an identifier is already registered.
#[derive(Clone)]
pub struct UniquenessChecker {
    transport: Arc<dyn SignupTransport>,
}

impl UniquenessChecker {
    pub fn new(transport: Arc<dyn SignupTransport>) -> Self {
        Self { transport }
    }

    /// Never fails: transport errors and unexpected statuses become
    /// [`UniquenessResult::UnknownError`].
    pub async fn check_unique(&self, kind: IdentifierKind, value: &str) -> UniquenessResult {
        match self.request(kind, value).await {
            Ok(result) => result,
            Err(error) if error.is_transport() => {
                warn!(?kind, %error, "uniqueness check could not reach backend");
                UniquenessResult::UnknownError
            }
            Err(error) => {
                warn!(?kind, %error, "uniqueness check got an unusable reply");
                UniquenessResult::UnknownError
            }
        }
    }

    async fn request(
        &self,
        kind: IdentifierKind,
        value: &str,
    ) -> Result<UniquenessResult, BackendError> {
        match kind {
            IdentifierKind::Email => {
                let body = encode_body(&EmailCheckRequest {
                    email: value.to_string(),
                })?;
                let res = self.transport.post_json(EMAIL_CHECK_PATH, body).await?;
                classify_email_check(&res)
            }
            IdentifierKind::Username => {
                let body = encode_body(&UsernameCheckRequest {
                    username: value.to_string(),
                })?;
                let res = self.transport.post_json(USERNAME_CHECK_PATH, body).await?;
                classify_username_check(&res)
            }
        }
    }
}

fn classify_email_check(res: &TransportResponse) -> Result<UniquenessResult, BackendError> {
    match res.status {
        STATUS_OK => Ok(UniquenessResult::Available),
        STATUS_CONFLICT => Ok(UniquenessResult::Taken),
        other => Err(BackendError::UnexpectedStatus(other)),
    }
}

fn classify_username_check(res: &TransportResponse) -> Result<UniquenessResult, BackendError> {
    if res.status == STATUS_CONFLICT {
        return Ok(UniquenessResult::Taken);
    }
    if !res.is_success() {
        return Err(BackendError::UnexpectedStatus(res.status));
    }
    let body: UsernameCheckResponse = res.decode()?;
    Ok(if body.exists {
        UniquenessResult::Taken
    } else {
        UniquenessResult::Available
    })
}
