use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;

use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::email_client::EmailClient;
use crate::emails::deliver_login_email;
use crate::models::User;
use crate::pages::{render_homepage, Homepage};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

#[derive(serde::Deserialize)]
pub struct LoginLinkFormData {
    email: String,
}

/// Emails a login link to a registered address. The reply is the same whether or not the
/// address is known.
#[tracing::instrument(
    name = "Requesting a login link",
    skip(form, transaction, settings, email_client),
    fields(email = %form.email)
)]
pub async fn send_login_link(
    form: web::Form<LoginLinkFormData>,
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
            let tenant = user
                .tenant(&mut transaction)
                .await
                .context("Failed to load the user's tenant.")?;
            deliver_login_email(&email, &tenant, &settings, &email_client).await?;
        }
        None => tracing::info!("No user is registered with this address, no link was sent"),
    }

    let notice = format!("A login link is on its way to {} if it belongs to an account.", email);
    Ok(render_homepage(
        StatusCode::OK,
        Homepage {
            notice: Some(&notice),
            ..Default::default()
        },
    ))
}
