pub mod login;
pub mod logout;
pub mod password_reset;
pub mod register;
pub mod request_otp;
pub mod verify_otp;

pub use login::{IssuedSession, LoginCredentials, LoginError, LoginResponse, LoginUseCase};
pub use logout::{LogoutError, LogoutUseCase};
pub use password_reset::{ResetPasswordError, ResetPasswordUseCase};
pub use register::{RegisterError, RegisterRequest, RegisterUseCase};
pub use request_otp::{OtpRequestOutcome, RequestOtpError, RequestOtpUseCase};
pub use verify_otp::VerifyOtpUseCase;
