use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;

use crate::authentication::decode_login_token;
use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::models::User;
use crate::pages::{render_application, render_homepage, Homepage};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

fn invalid_link() -> HttpResponse {
    render_homepage(
        StatusCode::UNAUTHORIZED,
        Homepage {
            error: Some("That login link is invalid or has expired."),
            ..Default::default()
        },
    )
}

/// Follows an emailed login link into the application.
#[tracing::instrument(name = "Logging in with a link", skip(token, transaction, settings))]
pub async fn login_with_token(
    token: web::Path<String>,
    transaction: RequestTransaction,
    settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, PageError> {
    let claims = match decode_login_token(&token, &settings) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected a login token");
            return Ok(invalid_link());
        }
    };
    let email = match UserEmail::parse(claims.sub) {
        Ok(email) => email,
        Err(_) => return Ok(invalid_link()),
    };

    let mut transaction = transaction.acquire().await?;
    let user = User::find_by_email(&mut transaction, &email)
        .await
        .context("Failed to look up the user.")?;
    match user {
        Some(user) if user.tenant_id == claims.tenant => Ok(render_application(&user, &settings)?),
        _ => Ok(invalid_link()),
    }
}
