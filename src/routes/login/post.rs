use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use secrecy::Secret;

use crate::authentication::{validate_credentials, AuthError, Credentials};
use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::pages::{render_application, render_homepage, Homepage};
use crate::request_transaction::RequestTransaction;
use crate::routes::PageError;

#[derive(serde::Deserialize)]
pub struct LoginFormData {
    email: String,
    password: Secret<String>,
}

fn login_failed() -> HttpResponse {
    render_homepage(
        StatusCode::UNAUTHORIZED,
        Homepage {
            error: Some("Authentication failed"),
            ..Default::default()
        },
    )
}

#[tracing::instrument(
    name = "Logging in with a password",
    skip(form, transaction, settings),
    fields(email = %form.email, user_id = tracing::field::Empty)
)]
pub async fn login(
    form: web::Form<LoginFormData>,
    transaction: RequestTransaction,
    settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, PageError> {
    let LoginFormData { email, password } = form.into_inner();
    let email = match UserEmail::parse(email) {
        Ok(email) => email,
        Err(_) => return Ok(login_failed()),
    };
    let credentials = Credentials { email, password };

    let mut transaction = transaction.acquire().await?;
    match validate_credentials(credentials, &mut transaction).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", &tracing::field::display(&user.id));
            Ok(render_application(&user, &settings)?)
        }
        Err(AuthError::InvalidCredentials(_)) => Ok(login_failed()),
        Err(AuthError::UnexpectedError(e)) => Err(e.into()),
    }
}
