use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{NewPassword, UserEmail};
use crate::models::User;
use crate::telemetry::spawn_blocking_with_tracing;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

pub struct Credentials {
    pub email: UserEmail,
    pub password: Secret<String>,
}

#[tracing::instrument(name = "Get stored credentials", skip(email, transaction))]
async fn get_stored_credentials(
    email: &UserEmail,
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<Option<(Uuid, Secret<String>)>, anyhow::Error> {
    // users who signed up without a password can only log in through emailed links
    let row: Option<(Uuid, String)> = sqlx::query_as(
        r#"
        SELECT id, password_digest
        FROM users
        WHERE email = $1 AND password_digest IS NOT NULL
        "#,
    )
    .bind(email.as_ref())
    .fetch_optional(&mut *transaction)
    .await
    .context("Failed to perform a query to retrieve stored credentials.")?;
    Ok(row.map(|(user_id, digest)| (user_id, Secret::new(digest))))
}

#[tracing::instrument(name = "Validate credentials", skip(credentials, transaction))]
pub async fn validate_credentials(
    credentials: Credentials,
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<User, AuthError> {
    let mut user_id = None;
    // verify against a fallback hash when the user is unknown, so both paths take as long
    let mut expected_password_hash = Secret::new(
        "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
            .to_string(),
    );
    if let Some((stored_user_id, stored_password_hash)) =
        get_stored_credentials(&credentials.email, transaction).await?
    {
        user_id = Some(stored_user_id);
        expected_password_hash = stored_password_hash;
    }

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;

    let user_id = user_id
        .ok_or_else(|| anyhow::anyhow!("Unknown email."))
        .map_err(AuthError::InvalidCredentials)?;
    User::find(transaction, user_id)
        .await
        .context("Failed to load the authenticated user.")?
        .ok_or_else(|| anyhow::anyhow!("The user disappeared while logging in."))
        .map_err(AuthError::UnexpectedError)
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;
    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)
}

/// Hashes a password with argon2id; CPU bound, so call it from a blocking thread.
pub fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None).context("Invalid argon2 parameters.")?;
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .context("Failed to hash password.")?
        .to_string();
    Ok(Secret::new(password_hash))
}

/// Stores a new password for the user, invalidating any outstanding reset token.
#[tracing::instrument(name = "Change password", skip(password, transaction))]
pub async fn change_password(
    user: &User,
    password: NewPassword,
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), anyhow::Error> {
    let password = password.into_inner();
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await?
        .context("Failed to hash password")?;
    user.update_password(transaction, password_hash.expose_secret())
        .await
        .context("Failed to change user's password in the database.")?;
    Ok(())
}
