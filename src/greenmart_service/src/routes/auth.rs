use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::Secret;
use serde::Deserialize;
use serde_json::json;

use greenmart_application::use_cases::{
    LoginCredentials, LoginResponse, LoginUseCase, LogoutUseCase, RegisterRequest,
    RegisterUseCase, RequestOtpUseCase, ResetPasswordUseCase, VerifyOtpUseCase,
};
use greenmart_core::{Email, OtpIdentity, OtpStrategy, Password};

use crate::routes::error::ApiError;
use crate::state::AuthState;

pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route("/otp", post(request_otp))
        .route("/otp/verify", post(verify_otp))
        .route("/token", post(token))
        .route("/register", post(register))
        .route("/password-reset", post(password_reset))
        .route("/logout", post(logout))
        .with_state(state)
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn parse_email(raw: String) -> Result<Email, ApiError> {
    Email::try_from(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn parse_strategy(raw: &str) -> Result<OtpStrategy, ApiError> {
    OtpStrategy::parse(raw).ok_or_else(|| ApiError::bad_request("Unsupported OTP strategy"))
}

/// Identifies the caller from the bearer token, fingerprint included.
pub(crate) fn authenticated_user(
    access_tokens: &greenmart_adapters::tokens::JwtAccessTokens,
    headers: &HeaderMap,
) -> Result<i64, ApiError> {
    use greenmart_core::AccessTokens as _;

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::forbidden("Missing bearer token"))?;

    access_tokens
        .verify(token, &user_agent(headers))
        .map_err(|_| ApiError::forbidden("Invalid access token"))
}

#[derive(Debug, Deserialize)]
struct OtpRequestBody {
    strategy: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct OtpQuery {
    /// "Do not send" flag: generate and store the code without dispatching.
    #[serde(default)]
    dns: bool,
}

#[tracing::instrument(name = "Request OTP", skip_all)]
async fn request_otp(
    State(state): State<AuthState>,
    Query(query): Query<OtpQuery>,
    Json(body): Json<OtpRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let strategy = parse_strategy(&body.strategy)?;
    let identity = OtpIdentity::Email(parse_email(body.email)?);

    let use_case = RequestOtpUseCase::new(state.users.as_ref(), state.otp.as_ref());
    let outcome = use_case.execute(strategy, identity, query.dns).await?;

    Ok(Json(json!({
        "is_existing": outcome.is_existing,
        "status": true,
    })))
}

#[derive(Debug, Deserialize)]
struct OtpVerifyBody {
    strategy: String,
    email: String,
    otp: String,
}

#[tracing::instrument(name = "Verify OTP", skip_all)]
async fn verify_otp(
    State(state): State<AuthState>,
    Json(body): Json<OtpVerifyBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let strategy = parse_strategy(&body.strategy)?;
    let identity = OtpIdentity::Email(parse_email(body.email)?);

    let use_case = VerifyOtpUseCase::new(state.users.as_ref(), state.otp.as_ref());
    use_case.execute(strategy, identity, &body.otp).await?;

    Ok(Json(json!({
        "status": true,
        "message": "Entered OTP is correct",
    })))
}

#[derive(Debug, Deserialize)]
struct TokenRequestBody {
    strategy: String,
    email: Option<String>,
    password: Option<Secret<String>>,
    refresh_token: Option<String>,
}

#[tracing::instrument(name = "Issue tokens", skip_all)]
async fn token(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Json(body): Json<TokenRequestBody>,
) -> Result<Response, ApiError> {
    let user_agent = user_agent(&headers);

    let credentials = match body.strategy.as_str() {
        "password" => {
            let email = parse_email(
                body.email
                    .ok_or_else(|| ApiError::bad_request("Missing email"))?,
            )?;
            let password = body
                .password
                .and_then(|raw| Password::try_from(raw).ok())
                .ok_or_else(|| ApiError::bad_request("Bad credentials"))?;
            LoginCredentials::Password { email, password }
        }
        "refresh_token" => LoginCredentials::RefreshToken {
            refresh_token: body
                .refresh_token
                .ok_or_else(|| ApiError::bad_request("Missing refresh token"))?,
        },
        _ => return Err(ApiError::bad_request("Unsupported auth strategy")),
    };

    let use_case = LoginUseCase::new(
        state.users.as_ref(),
        state.refresh_tokens.as_ref(),
        state.access_tokens.as_ref(),
    );

    match use_case.execute(credentials, &user_agent).await? {
        LoginResponse::Session(session) => Ok(Json(json!({
            "user": session.user,
            "token": session.token,
            "refresh_token": session.refresh_token,
        }))
        .into_response()),
        LoginResponse::AccessToken { token } => {
            Ok(Json(json!({ "token": token })).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: String,
    display_name: Option<String>,
    email: String,
    password: Secret<String>,
    otp: String,
}

#[tracing::instrument(name = "Register", skip_all)]
async fn register(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_agent = user_agent(&headers);
    let request = RegisterRequest {
        name: body.name,
        display_name: body.display_name,
        email: parse_email(body.email)?,
        password: Password::try_from(body.password)
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        otp: body.otp,
    };

    let use_case = RegisterUseCase::new(
        state.users.as_ref(),
        state.otp.as_ref(),
        state.refresh_tokens.as_ref(),
        state.access_tokens.as_ref(),
    );
    let session = use_case.execute(request, &user_agent).await?;

    Ok(Json(json!({
        "user": session.user,
        "token": session.token,
        "refresh_token": session.refresh_token,
    })))
}

#[derive(Debug, Deserialize)]
struct PasswordResetBody {
    email: String,
    password: Secret<String>,
    otp: String,
}

#[tracing::instrument(name = "Password reset", skip_all)]
async fn password_reset(
    State(state): State<AuthState>,
    Json(body): Json<PasswordResetBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let email = parse_email(body.email)?;
    let password = Password::try_from(body.password)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let use_case = ResetPasswordUseCase::new(state.users.as_ref(), state.otp.as_ref());
    use_case.execute(email, &body.otp, password).await?;

    Ok(Json(json!({
        "status": true,
        "message": "password updated",
    })))
}

#[tracing::instrument(name = "Logout", skip_all)]
async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = authenticated_user(state.access_tokens.as_ref(), &headers)?;

    let use_case = LogoutUseCase::new(state.refresh_tokens.as_ref());
    use_case.execute(user_id).await?;

    Ok(Json(json!({
        "status": true,
        "message": "success",
    })))
}
