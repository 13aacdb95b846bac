use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
    password_hash::{PasswordHasher, SaltString, rand_core},
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row as _};

use greenmart_core::{Email, NewUser, Password, UserProfile, UserStore, UserStoreError};

const PROFILE_COLUMNS: &str =
    "user_id, name, display_name, email, gender, created_at, updated_at";

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, UserStoreError> {
    let email: String = row
        .try_get("email")
        .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;
    let email = Email::try_from(email).map_err(|e| UserStoreError::Unexpected(e.to_string()))?;

    Ok(UserProfile {
        user_id: row
            .try_get::<i64, _>("user_id")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
        email,
        gender: row
            .try_get("gender")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[tracing::instrument(name = "Adding user to PostgreSQL", skip_all)]
    async fn add_user(&self, new_user: NewUser) -> Result<UserProfile, UserStoreError> {
        let password_hash = compute_password_hash(new_user.password)
            .await
            .map_err(UserStoreError::Unexpected)?;

        let query = format!(
            "INSERT INTO users (name, display_name, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&new_user.name)
            .bind(&new_user.display_name)
            .bind(new_user.email.as_str())
            .bind(password_hash.expose_secret())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.constraint().is_some() {
                        return UserStoreError::EmailTaken;
                    }
                }
                UserStoreError::Unexpected(e.to_string())
            })?;

        profile_from_row(&row)
    }

    #[tracing::instrument(name = "Retrieving user by email from PostgreSQL", skip_all)]
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, UserStoreError> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = $1 AND is_deleted = FALSE"
        );
        let row = sqlx::query(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    #[tracing::instrument(name = "Retrieving user by id from PostgreSQL", skip_all)]
    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, UserStoreError> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE user_id = $1 AND is_deleted = FALSE"
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    #[tracing::instrument(name = "Validating user credentials in PostgreSQL", skip_all)]
    async fn authenticate(
        &self,
        email: &Email,
        password: &Password,
    ) -> Result<UserProfile, UserStoreError> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS}, password_hash \
             FROM users WHERE email = $1 AND is_deleted = FALSE"
        );
        let row = sqlx::query(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;

        // A missing account and a wrong password are indistinguishable to
        // the caller.
        let Some(row) = row else {
            return Err(UserStoreError::BadCredentials);
        };

        // Accounts without a stored hash (admin-created, pre-reset) cannot
        // authenticate with a password.
        let password_hash: Option<String> = row
            .try_get("password_hash")
            .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;
        let password_hash = password_hash.ok_or(UserStoreError::BadCredentials)?;
        verify_password_hash(Secret::from(password_hash), password.clone())
            .await
            .map_err(|_| UserStoreError::BadCredentials)?;

        profile_from_row(&row)
    }

    #[tracing::instrument(name = "Set new password", skip_all)]
    async fn set_password(
        &self,
        user_id: i64,
        new_password: Password,
    ) -> Result<(), UserStoreError> {
        let password_hash = compute_password_hash(new_password)
            .await
            .map_err(UserStoreError::Unexpected)?;

        let outcome = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = now() \
             WHERE user_id = $2 AND is_deleted = FALSE",
        )
        .bind(password_hash.expose_secret())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| UserStoreError::Unexpected(e.to_string()))?;

        if outcome.rows_affected() == 0 {
            return Err(UserStoreError::UserNotFound);
        }
        Ok(())
    }
}

#[tracing::instrument(name = "Verify password hash", skip_all)]
async fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Password,
) -> Result<(), String> {
    let current_span: tracing::Span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        current_span.in_scope(|| {
            let expected_password_hash: PasswordHash<'_> =
                PasswordHash::new(expected_password_hash.expose_secret())
                    .map_err(|e| e.to_string())?;

            Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(15000, 2, 1, None).map_err(|e| e.to_string())?,
            )
            .verify_password(
                password_candidate.as_ref().expose_secret().as_bytes(),
                &expected_password_hash,
            )
            .map_err(|e| e.to_string())
        })
    })
    .await
    .map_err(|e| e.to_string())?
}

#[tracing::instrument(name = "Computing password hash", skip_all)]
async fn compute_password_hash(password: Password) -> Result<Secret<String>, String> {
    let current_span: tracing::Span = tracing::Span::current();
    tokio::task::spawn_blocking(move || {
        current_span.in_scope(move || {
            let salt: SaltString = SaltString::generate(rand_core::OsRng);
            let hasher = Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                Params::new(15000, 2, 1, None).map_err(|e| e.to_string())?,
            );
            hasher
                .hash_password(password.as_ref().expose_secret().as_bytes(), &salt)
                .map(|hash| Secret::from(hash.to_string()))
                .map_err(|e| e.to_string())
        })
    })
    .await
    .map_err(|e| e.to_string())?
}
