use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};

use super::{reset_token_lifetime, INVALID_RESET_LINK};
use crate::authentication::change_password;
use crate::configuration::ApplicationSettings;
use crate::domain::NewPassword;
use crate::models::User;
use crate::pages::{render_application, render_not_found_page, render_password_reset_page};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

#[derive(serde::Deserialize)]
pub struct ResetPasswordFormData {
    password: Secret<String>,
    password_check: Secret<String>,
}

#[tracing::instrument(
    name = "Resetting a password",
    skip(token, form, transaction, settings),
    fields(user_id = tracing::field::Empty)
)]
pub async fn reset_password(
    token: web::Path<String>,
    form: web::Form<ResetPasswordFormData>,
    transaction: RequestTransaction,
    settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, PageError> {
    let mut transaction = transaction.acquire().await?;
    let user = match User::find_by_reset_token(&mut transaction, &token, reset_token_lifetime())
        .await
        .context("Failed to look up the password reset token.")?
    {
        Some(user) => user,
        None => return Ok(render_not_found_page(INVALID_RESET_LINK)),
    };
    tracing::Span::current().record("user_id", &tracing::field::display(&user.id));

    let ResetPasswordFormData {
        password,
        password_check,
    } = form.into_inner();
    if password.expose_secret() != password_check.expose_secret() {
        return Ok(render_password_reset_page(
            StatusCode::BAD_REQUEST,
            &token,
            Some("You entered two different new passwords - the field values must match."),
        ));
    }
    let password = match NewPassword::parse(password) {
        Ok(password) => password,
        Err(error) => {
            return Ok(render_password_reset_page(
                StatusCode::BAD_REQUEST,
                &token,
                Some(error.as_str()),
            ))
        }
    };

    change_password(&user, password, &mut transaction).await?;
    Ok(render_application(&user, &settings)?)
}
