use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Context;
use secrecy::ExposeSecret;

use crate::authentication::compute_password_hash;
use crate::configuration::ApplicationSettings;
use crate::domain::{NewSignup, SignupData};
use crate::email_client::EmailClient;
use crate::emails::deliver_login_email;
use crate::models::{NewUser, Tenant, User};
use crate::pages::{render_application, render_homepage, Homepage};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;
use crate::telemetry::spawn_blocking_with_tracing;

/// Every tenant starts with the user who created it.
const FOUNDER_ROLE: &str = "admin";

fn signup_rejected(form: &SignupData, error: &str) -> HttpResponse {
    render_homepage(
        StatusCode::BAD_REQUEST,
        Homepage {
            signup: Some(form),
            error: Some(error),
            notice: None,
        },
    )
}

/// Creates a tenant together with its first user, then drops the new user straight into the
/// application. A login link is emailed as well so they can come back later.
#[tracing::instrument(
    name = "Signing up a new tenant",
    skip(form, transaction, settings, email_client),
    fields(user_email = %form.email, tenant_name = %form.tenant)
)]
pub async fn signup(
    form: web::Form<SignupData>,
    transaction: RequestTransaction,
    settings: web::Data<ApplicationSettings>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, PageError> {
    let form = form.into_inner();
    let new_signup = match NewSignup::try_from(&form) {
        Ok(new_signup) => new_signup,
        Err(error) => return Ok(signup_rejected(&form, &error)),
    };

    let password_digest = match new_signup.password {
        Some(password) => {
            let password = password.into_inner();
            let digest = spawn_blocking_with_tracing(move || compute_password_hash(password))
                .await
                .context("Failed to spawn blocking task.")??;
            Some(digest.expose_secret().to_owned())
        }
        None => None,
    };

    let mut transaction = transaction.acquire().await?;
    let existing_user = User::find_by_email(&mut transaction, &new_signup.email)
        .await
        .context("Failed to look up existing users.")?;
    if existing_user.is_some() {
        return Ok(signup_rejected(
            &form,
            "That email address is already registered. Try logging in instead.",
        ));
    }

    let tenant = Tenant::insert(&mut transaction, &new_signup.tenant, &new_signup.email)
        .await
        .context("Failed to insert the new tenant.")?;
    let user = User::insert(
        &mut transaction,
        NewUser {
            tenant: &tenant,
            name: &new_signup.name,
            email: &new_signup.email,
            role: FOUNDER_ROLE,
            password_digest,
        },
    )
    .await
    .context("Failed to insert the new user.")?;

    deliver_login_email(&new_signup.email, &tenant, &settings, &email_client).await?;

    Ok(render_application(&user, &settings)?)
}
