//! Auth lifecycles over the in-memory cache with its logical clock:
//! OTP cooldown and expiry windows, refresh-token fingerprint binding and
//! the composed login / register / reset flows.

use std::time::Duration;

use secrecy::Secret;

use greenmart_adapters::cache::InMemoryCacheStore;
use greenmart_adapters::delivery::{MockEmailClient, MockSmsClient};
use greenmart_adapters::persistence::InMemoryUserStore;
use greenmart_adapters::tokens::JwtAccessTokens;
use greenmart_application::otp::{OTP_RESEND_COOLDOWN_SECONDS, OtpError, OtpLifecycle};
use greenmart_application::refresh_token::{
    REFRESH_TOKEN_TTL_SECONDS, RefreshTokenError, RefreshTokenLifecycle,
};
use greenmart_application::use_cases::{
    LoginCredentials, LoginError, LoginResponse, LoginUseCase, LogoutUseCase, RegisterError,
    RegisterRequest, RegisterUseCase, ResetPasswordUseCase,
};
use greenmart_core::{
    Email, NewUser, OtpIdentity, OtpStrategy, Password, UserStore, UserStoreError, UserType,
};

fn email(address: &str) -> Email {
    Email::try_from(address.to_string()).unwrap()
}

fn password(raw: &str) -> Password {
    Password::try_from(Secret::from(raw.to_string())).unwrap()
}

fn otp_lifecycle(
    cache: InMemoryCacheStore,
) -> OtpLifecycle<InMemoryCacheStore, MockEmailClient, MockSmsClient> {
    OtpLifecycle::new(cache, MockEmailClient::new(), MockSmsClient::new())
}

fn access_tokens() -> JwtAccessTokens {
    JwtAccessTokens::new(Secret::from("test-signing-secret".to_string()), 900)
}

#[tokio::test]
async fn otp_cooldown_lifts_after_the_window_and_the_code_survives() {
    let cache = InMemoryCacheStore::new();
    let otp = otp_lifecycle(cache.clone());
    let identity = OtpIdentity::Email(email("a@b.com"));

    let first = otp
        .send_otp(OtpStrategy::Login, &identity, false)
        .await
        .unwrap();

    let second = otp.send_otp(OtpStrategy::Login, &identity, false).await;
    match second {
        Err(OtpError::Cooldown { seconds_remaining }) => {
            assert!(seconds_remaining > 0);
            assert!(seconds_remaining <= OTP_RESEND_COOLDOWN_SECONDS);
        }
        other => panic!("expected cooldown, got {other:?}"),
    }

    // Past the cooldown but within the code's own TTL: the same code is
    // re-sent rather than a fresh one minted.
    cache.advance(Duration::from_secs(31)).await;
    let third = otp
        .send_otp(OtpStrategy::Login, &identity, false)
        .await
        .unwrap();
    assert_eq!(first, third);
}

#[tokio::test]
async fn otp_expires_with_the_backend_ttl() {
    let cache = InMemoryCacheStore::new();
    let otp = otp_lifecycle(cache.clone());
    let identity = OtpIdentity::Email(email("a@b.com"));

    let code = otp
        .send_otp(OtpStrategy::Login, &identity, true)
        .await
        .unwrap();

    cache.advance(Duration::from_secs(299)).await;
    assert!(
        otp.verify_otp(OtpStrategy::Login, &identity, code.as_str())
            .await
            .is_ok()
    );

    cache.advance(Duration::from_secs(2)).await;
    let expired = otp
        .verify_otp(OtpStrategy::Login, &identity, code.as_str())
        .await;
    assert!(matches!(expired, Err(OtpError::IncorrectCode)));
}

#[tokio::test]
async fn expired_code_is_replaced_by_a_live_one_on_the_next_send() {
    let cache = InMemoryCacheStore::new();
    let otp = otp_lifecycle(cache.clone());
    let identity = OtpIdentity::Email(email("a@b.com"));

    otp.send_otp(OtpStrategy::Login, &identity, true)
        .await
        .unwrap();

    // Both the code and the cooldown marker lapse.
    cache.advance(Duration::from_secs(301)).await;

    let fresh = otp
        .send_otp(OtpStrategy::Login, &identity, true)
        .await
        .unwrap();
    assert!(
        otp.verify_otp(OtpStrategy::Login, &identity, fresh.as_str())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn refresh_token_fingerprint_binding_clears_the_lineage_on_mismatch() {
    let refresh = RefreshTokenLifecycle::new(InMemoryCacheStore::new(), access_tokens());

    let token = refresh
        .issue(UserType::User, 7, "Mozilla/5.0 (device A)")
        .await
        .unwrap();

    let stolen = refresh
        .verify(UserType::User, &token, "Mozilla/5.0 (device B)")
        .await;
    assert!(matches!(stolen, Err(RefreshTokenError::Rejected)));

    // The lineage is cleared for the original fingerprint too.
    let original = refresh
        .verify(UserType::User, &token, "Mozilla/5.0 (device A)")
        .await;
    assert!(matches!(original, Err(RefreshTokenError::Rejected)));
}

#[tokio::test]
async fn refresh_token_lapses_after_its_ttl() {
    let cache = InMemoryCacheStore::new();
    let refresh = RefreshTokenLifecycle::new(cache.clone(), access_tokens());

    let token = refresh
        .issue(UserType::User, 7, "device-a")
        .await
        .unwrap();

    cache
        .advance(Duration::from_secs(REFRESH_TOKEN_TTL_SECONDS + 1))
        .await;
    let lapsed = refresh.verify(UserType::User, &token, "device-a").await;
    assert!(matches!(lapsed, Err(RefreshTokenError::Rejected)));
}

#[tokio::test]
async fn successful_reuse_extends_the_refresh_ttl() {
    let cache = InMemoryCacheStore::new();
    let refresh = RefreshTokenLifecycle::new(cache.clone(), access_tokens());

    let token = refresh
        .issue(UserType::User, 7, "device-a")
        .await
        .unwrap();

    // Nearly lapse, reuse, then nearly lapse again: still valid because
    // every successful verify rewrites both indices with a fresh TTL.
    cache
        .advance(Duration::from_secs(REFRESH_TOKEN_TTL_SECONDS - 10))
        .await;
    assert!(refresh.verify(UserType::User, &token, "device-a").await.is_ok());

    cache
        .advance(Duration::from_secs(REFRESH_TOKEN_TTL_SECONDS - 10))
        .await;
    assert!(refresh.verify(UserType::User, &token, "device-a").await.is_ok());
}

#[tokio::test]
async fn register_login_logout_flow() {
    let cache = InMemoryCacheStore::new();
    let users = InMemoryUserStore::new();
    let otp = otp_lifecycle(cache.clone());
    let tokens = access_tokens();
    let refresh = RefreshTokenLifecycle::new(cache.clone(), tokens.clone());
    let user_agent = "Mozilla/5.0 (device A)";

    // Registration requires a verified code.
    let code = otp
        .send_otp(
            OtpStrategy::Login,
            &OtpIdentity::Email(email("new@example.com")),
            true,
        )
        .await
        .unwrap();

    let register = RegisterUseCase::new(&users, &otp, &refresh, &tokens);
    let session = register
        .execute(
            RegisterRequest {
                name: "New User".to_string(),
                display_name: None,
                email: email("new@example.com"),
                password: password("password123"),
                otp: code.as_str().to_string(),
            },
            user_agent,
        )
        .await
        .unwrap();
    assert_eq!(session.user.email.as_str(), "new@example.com");
    assert!(!session.refresh_token.is_empty());

    // Same email again is rejected up front.
    let duplicate = register
        .execute(
            RegisterRequest {
                name: "New User".to_string(),
                display_name: None,
                email: email("new@example.com"),
                password: password("password123"),
                otp: code.as_str().to_string(),
            },
            user_agent,
        )
        .await;
    assert!(matches!(duplicate, Err(RegisterError::EmailTaken)));

    // Password login issues a full session; wrong password is rejected.
    let login = LoginUseCase::new(&users, &refresh, &tokens);
    let full = login
        .execute(
            LoginCredentials::Password {
                email: email("new@example.com"),
                password: password("password123"),
            },
            user_agent,
        )
        .await
        .unwrap();
    let issued = match full {
        LoginResponse::Session(session) => session,
        other => panic!("expected a full session, got {other:?}"),
    };

    let wrong = login
        .execute(
            LoginCredentials::Password {
                email: email("new@example.com"),
                password: password("wrong-password"),
            },
            user_agent,
        )
        .await;
    assert!(matches!(
        wrong,
        Err(LoginError::UserStore(UserStoreError::BadCredentials))
    ));

    // The refresh strategy yields only a fresh access token.
    let refreshed = login
        .execute(
            LoginCredentials::RefreshToken {
                refresh_token: issued.refresh_token.clone(),
            },
            user_agent,
        )
        .await
        .unwrap();
    assert!(matches!(refreshed, LoginResponse::AccessToken { .. }));

    // Logout drops the lineage; the refresh token stops working.
    let logout = LogoutUseCase::new(&refresh);
    logout.execute(issued.user.user_id).await.unwrap();

    let after_logout = login
        .execute(
            LoginCredentials::RefreshToken {
                refresh_token: issued.refresh_token,
            },
            user_agent,
        )
        .await;
    assert!(matches!(
        after_logout,
        Err(LoginError::RefreshToken(RefreshTokenError::Rejected))
    ));
}

#[tokio::test]
async fn password_reset_flow_swaps_the_credential() {
    let cache = InMemoryCacheStore::new();
    let users = InMemoryUserStore::new();
    let otp = otp_lifecycle(cache.clone());

    users
        .add_user(NewUser {
            name: "Existing".to_string(),
            display_name: None,
            email: email("existing@example.com"),
            password: password("old-password"),
        })
        .await
        .unwrap();

    let code = otp
        .send_otp(
            OtpStrategy::Reset,
            &OtpIdentity::Email(email("existing@example.com")),
            true,
        )
        .await
        .unwrap();

    let reset = ResetPasswordUseCase::new(&users, &otp);
    reset
        .execute(
            email("existing@example.com"),
            code.as_str(),
            password("new-password"),
        )
        .await
        .unwrap();

    assert!(
        users
            .authenticate(&email("existing@example.com"), &password("new-password"))
            .await
            .is_ok()
    );
    assert_eq!(
        users
            .authenticate(&email("existing@example.com"), &password("old-password"))
            .await
            .unwrap_err(),
        UserStoreError::BadCredentials
    );
}
