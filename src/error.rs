use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    auth::{PasswordError, TokenError},
    storage::StorageError,
    users::repo::StoreError,
};

/// Which account operation hit the store when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    ListUsers,
    Signup,
    Login,
}

impl StoreOp {
    fn client_message(self) -> &'static str {
        match self {
            StoreOp::ListUsers => "Fetching users failed, please try again later",
            StoreOp::Signup => "Creating user failed, please try again",
            StoreOp::Login => "Logging in failed, please try again later",
        }
    }
}

/// Every way an account request can fail. The `IntoResponse` impl is the
/// only place these become client-facing messages.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid input: {}", .0.join(", "))]
    InvalidInput(Vec<&'static str>),

    #[error("account already exists")]
    DuplicateAccount,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("store unavailable during {0:?}")]
    StoreUnavailable(StoreOp, #[source] StoreError),

    #[error("password hashing failed")]
    HashingFailure(#[source] PasswordError),

    #[error("token issuance failed")]
    TokenIssuanceFailure(#[source] TokenError),

    #[error("image upload failed")]
    UploadFailure(#[source] StorageError),

    #[error("route not found")]
    NotFound,
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::InvalidInput(_) | AccountError::DuplicateAccount => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::StoreUnavailable(..)
            | AccountError::HashingFailure(_)
            | AccountError::TokenIssuanceFailure(_)
            | AccountError::UploadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_message(&self) -> &'static str {
        match self {
            AccountError::InvalidInput(_) => "Invalid inputs passed, please check your data",
            AccountError::DuplicateAccount => {
                "A user with this email already exists, please login instead."
            }
            AccountError::InvalidCredentials => "Invalid credentials, could not log you in",
            AccountError::StoreUnavailable(op, _) => op.client_message(),
            AccountError::HashingFailure(_) => "Could not create user, please try again",
            AccountError::TokenIssuanceFailure(_) => {
                "Could not issue a session token, please try again"
            }
            AccountError::UploadFailure(_) => "Could not store the uploaded image, please try again",
            AccountError::NotFound => "Could not find this route",
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let cause = std::error::Error::source(&self)
                .map(|e| e.to_string())
                .unwrap_or_default();
            error!(kind = %self, cause = %cause, "request failed");
        } else {
            warn!(kind = %self, %status, "request rejected");
        }

        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}

pub async fn not_found() -> AccountError {
    AccountError::NotFound
}
