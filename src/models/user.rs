use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{UserEmail, UserName};
use crate::models::Tenant;

/// A user as exposed to the browser client. Credentials never leave the `users` table
/// through this type.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub tenant: &'a Tenant,
    pub name: &'a UserName,
    pub email: &'a UserEmail,
    pub role: &'a str,
    pub password_digest: Option<String>,
}

const USER_COLUMNS: &str = "id, tenant_id, name, email, role, created_at";

impl User {
    #[tracing::instrument(
        name = "Saving new user in the database",
        skip(transaction, new_user),
        fields(user_email = %new_user.email, tenant_id = %new_user.tenant.id)
    )]
    pub async fn insert(
        transaction: &mut Transaction<'_, Postgres>,
        new_user: NewUser<'_>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, tenant_id, name, email, role, password_digest)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_user.tenant.id)
        .bind(new_user.name.as_ref())
        .bind(new_user.email.as_ref())
        .bind(new_user.role)
        .bind(new_user.password_digest)
        .fetch_one(&mut *transaction)
        .await
    }

    pub async fn find(
        transaction: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *transaction)
        .await
    }

    #[tracing::instrument(name = "Looking up user by email", skip(transaction))]
    pub async fn find_by_email(
        transaction: &mut Transaction<'_, Postgres>,
        email: &UserEmail,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.as_ref())
        .fetch_optional(&mut *transaction)
        .await
    }

    /// Loads the tenant this user belongs to.
    pub async fn tenant(
        &self,
        transaction: &mut Transaction<'_, Postgres>,
    ) -> Result<Tenant, sqlx::Error> {
        Tenant::find(transaction, self.tenant_id).await
    }

    #[tracing::instrument(
        name = "Storing password reset token",
        skip(self, transaction, token),
        fields(user_id = %self.id)
    )]
    pub async fn store_reset_token(
        &self,
        transaction: &mut Transaction<'_, Postgres>,
        token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $1, reset_token_created_at = now()
            WHERE id = $2
            "#,
        )
        .bind(token)
        .bind(self.id)
        .execute(&mut *transaction)
        .await?;
        Ok(())
    }

    /// Finds the user owning a reset token issued within the last `max_age`.
    #[tracing::instrument(name = "Looking up user by reset token", skip(transaction, token))]
    pub async fn find_by_reset_token(
        transaction: &mut Transaction<'_, Postgres>,
        token: &str,
        max_age: chrono::Duration,
    ) -> Result<Option<User>, sqlx::Error> {
        let issued_after = Utc::now() - max_age;
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE reset_token = $1 AND reset_token_created_at > $2
            "#,
            USER_COLUMNS
        ))
        .bind(token)
        .bind(issued_after)
        .fetch_optional(&mut *transaction)
        .await
    }

    /// Replaces the password digest and invalidates any outstanding reset token.
    #[tracing::instrument(
        name = "Updating password",
        skip(self, transaction, password_digest),
        fields(user_id = %self.id)
    )]
    pub async fn update_password(
        &self,
        transaction: &mut Transaction<'_, Postgres>,
        password_digest: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_digest = $1, reset_token = NULL, reset_token_created_at = NULL
            WHERE id = $2
            "#,
        )
        .bind(password_digest)
        .bind(self.id)
        .execute(&mut *transaction)
        .await?;
        Ok(())
    }
}
