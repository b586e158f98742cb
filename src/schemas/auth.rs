use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schemas::user::UserResponse;

/// The uid has already been authenticated by the identity provider.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LoginRequest {
    #[validate(length(min = 1, max = 128, message = "uid must be 1..128 characters"))]
    pub(crate) uid: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) user: UserResponse,
    pub(crate) expires_at: String,
}
