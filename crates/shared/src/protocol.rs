use serde::{Deserialize, Serialize};

pub const EMAIL_CHECK_PATH: &str = "/email/check";
pub const USERNAME_CHECK_PATH: &str = "/api/check-username";
pub const VERIFICATION_SEND_PATH: &str = "/email/verification";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailCheckRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameCheckRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameCheckResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendVerificationCodeRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendVerificationCodeResponse {
    pub code: String,
}
