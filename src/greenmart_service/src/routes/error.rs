use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use greenmart_application::{
    LoginError, LogoutError, OtpError, RefreshTokenError, RegisterError, RepositoryError,
    RequestOtpError, ResetPasswordError,
};
use greenmart_core::UserStoreError;

/// Non-standard status signalling an invalid or expired refresh token.
const TOKEN_EXPIRED: u16 = 498;

/// Error shape every route returns: a status code plus a one-line message,
/// serialized as `{"statusCode": ..., "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Not found".to_string(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn token_expired(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(TOKEN_EXPIRED)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "statusCode": self.status.as_u16(),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        Self::server(error.to_string())
    }
}

impl From<OtpError> for ApiError {
    fn from(error: OtpError) -> Self {
        match &error {
            OtpError::Cooldown { .. } | OtpError::IncorrectCode => {
                Self::bad_request(error.to_string())
            }
            OtpError::Delivery(_) | OtpError::Cache(_) => Self::server(error.to_string()),
        }
    }
}

impl From<RefreshTokenError> for ApiError {
    fn from(error: RefreshTokenError) -> Self {
        match &error {
            RefreshTokenError::Rejected => Self::token_expired(error.to_string()),
            RefreshTokenError::Cache(_) => Self::server(error.to_string()),
        }
    }
}

impl From<UserStoreError> for ApiError {
    fn from(error: UserStoreError) -> Self {
        match &error {
            UserStoreError::BadCredentials | UserStoreError::EmailTaken => {
                Self::bad_request(error.to_string())
            }
            UserStoreError::UserNotFound => Self::not_found(),
            UserStoreError::Unexpected(_) => Self::server(error.to_string()),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(error: LoginError) -> Self {
        match error {
            LoginError::UnknownAccount => Self::bad_request(error.to_string()),
            LoginError::UserStore(inner) => inner.into(),
            LoginError::RefreshToken(inner) => inner.into(),
            LoginError::AccessToken(inner) => Self::server(inner.to_string()),
        }
    }
}

impl From<RegisterError> for ApiError {
    fn from(error: RegisterError) -> Self {
        match error {
            RegisterError::EmailTaken => Self::bad_request(error.to_string()),
            RegisterError::Otp(inner) => inner.into(),
            RegisterError::UserStore(inner) => inner.into(),
            RegisterError::RefreshToken(inner) => inner.into(),
            RegisterError::AccessToken(inner) => Self::server(inner.to_string()),
        }
    }
}

impl From<ResetPasswordError> for ApiError {
    fn from(error: ResetPasswordError) -> Self {
        match error {
            ResetPasswordError::UnknownAccount => Self::bad_request(error.to_string()),
            ResetPasswordError::Otp(inner) => inner.into(),
            ResetPasswordError::UserStore(inner) => inner.into(),
        }
    }
}

impl From<RequestOtpError> for ApiError {
    fn from(error: RequestOtpError) -> Self {
        match error {
            RequestOtpError::AlreadyRegistered => Self::bad_request(error.to_string()),
            RequestOtpError::Otp(inner) => inner.into(),
            RequestOtpError::UserStore(inner) => inner.into(),
        }
    }
}

impl From<LogoutError> for ApiError {
    fn from(error: LogoutError) -> Self {
        match error {
            LogoutError::RefreshToken(inner) => inner.into(),
        }
    }
}
