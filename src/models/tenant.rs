use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{TenantName, UserEmail};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub identifier: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Inserts a new tenant. The identifier is derived from the name and made unique by
    /// appending a short random suffix when it is already taken.
    #[tracing::instrument(name = "Saving new tenant in the database", skip(transaction))]
    pub async fn insert(
        transaction: &mut Transaction<'_, Postgres>,
        name: &TenantName,
        email: &UserEmail,
    ) -> Result<Tenant, sqlx::Error> {
        let mut identifier = name.identifier();
        if identifier.is_empty()
            || Self::find_by_identifier(transaction, &identifier)
                .await?
                .is_some()
        {
            let suffix = Uuid::new_v4().simple().to_string();
            identifier = format!("{}-{}", identifier, &suffix[..8])
                .trim_start_matches('-')
                .to_string();
        }
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (id, name, identifier, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, identifier, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name.as_ref())
        .bind(&identifier)
        .bind(email.as_ref())
        .fetch_one(&mut *transaction)
        .await
    }

    #[tracing::instrument(name = "Loading tenant", skip(transaction))]
    pub async fn find(
        transaction: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
    ) -> Result<Tenant, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, identifier, email, created_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *transaction)
        .await
    }

    pub async fn find_by_identifier(
        transaction: &mut Transaction<'_, Postgres>,
        identifier: &str,
    ) -> Result<Option<Tenant>, sqlx::Error> {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, identifier, email, created_at
            FROM tenants
            WHERE identifier = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&mut *transaction)
        .await
    }
}
