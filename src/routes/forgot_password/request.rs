use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;

use crate::authentication::generate_reset_token;
use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::email_client::EmailClient;
use crate::emails::deliver_reset_email;
use crate::models::User;
use crate::pages::{render_homepage, Homepage};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

#[derive(serde::Deserialize)]
pub struct ForgotPasswordFormData {
    email: String,
}

#[tracing::instrument(
    name = "Requesting a password reset",
    skip(form, transaction, settings, email_client),
    fields(email = %form.email)
)]
pub async fn request_password_reset(
    form: web::Form<ForgotPasswordFormData>,
    transaction: RequestTransaction,
    settings: web::Data<ApplicationSettings>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, PageError> {
    let email = match UserEmail::parse(form.into_inner().email) {
        Ok(email) => email,
        Err(error) => {
            return Ok(render_homepage(
                StatusCode::BAD_REQUEST,
                Homepage {
                    error: Some(error.as_str()),
                    ..Default::default()
                },
            ))
        }
    };

    let mut transaction = transaction.acquire().await?;
    let user = User::find_by_email(&mut transaction, &email)
        .await
        .context("Failed to look up the user.")?;
    match user {
        Some(user) => {
            let token = generate_reset_token();
            user.store_reset_token(&mut transaction, &token)
                .await
                .context("Failed to store the password reset token.")?;
            deliver_reset_email(&user, &token, &mut transaction, &settings, &email_client).await?;
        }
        None => tracing::info!("No user is registered with this address, no reset email was sent"),
    }

    let notice = format!(
        "Instructions for resetting your password are on their way to {} if it belongs to an account.",
        email
    );
    Ok(render_homepage(
        StatusCode::OK,
        Homepage {
            notice: Some(&notice),
            ..Default::default()
        },
    ))
}
