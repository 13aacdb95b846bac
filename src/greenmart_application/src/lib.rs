pub mod otp;
pub mod refresh_token;
pub mod repository;
pub mod use_cases;

pub use otp::{OTP_RESEND_COOLDOWN_SECONDS, OTP_TTL_SECONDS, OtpError, OtpLifecycle};
pub use refresh_token::{
    REFRESH_TOKEN_TTL_SECONDS, RefreshTokenError, RefreshTokenLifecycle,
};
pub use repository::{
    CachedRepository, DEFAULT_CACHE_TTL, RepositoryError, purge_pattern,
};
pub use use_cases::{
    IssuedSession, LoginCredentials, LoginError, LoginResponse, LoginUseCase, LogoutError,
    LogoutUseCase, OtpRequestOutcome, RegisterError, RegisterRequest, RegisterUseCase,
    RequestOtpError, RequestOtpUseCase, ResetPasswordError, ResetPasswordUseCase,
    VerifyOtpUseCase,
};
