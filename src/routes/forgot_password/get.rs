use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;

use super::{reset_token_lifetime, INVALID_RESET_LINK};
use crate::models::User;
use crate::pages::{render_not_found_page, render_password_reset_page};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

#[tracing::instrument(name = "Showing the password reset form", skip(token, transaction))]
pub async fn password_reset_form(
    token: web::Path<String>,
    transaction: RequestTransaction,
) -> Result<HttpResponse, PageError> {
    let mut transaction = transaction.acquire().await?;
    let user = User::find_by_reset_token(&mut transaction, &token, reset_token_lifetime())
        .await
        .context("Failed to look up the password reset token.")?;
    Ok(match user {
        Some(_) => render_password_reset_page(StatusCode::OK, &token, None),
        None => render_not_found_page(INVALID_RESET_LINK),
    })
}
