use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::bootstrap::BootstrapError;
use crate::emails::EmailError;
use crate::error_handling::error_chain_fmt;
use crate::pages::render_error_page;
use crate::request_transaction::TransactionError;

mod forgot_password;
mod health_check;
mod home;
mod login;
mod not_found;
mod signup;

pub use forgot_password::*;
pub use health_check::*;
pub use home::*;
pub use login::*;
pub use not_found::*;
pub use signup::*;

/// Failures of page handlers. The user gets the generic error page; the cause chain is logged.
#[derive(thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let message = match self {
            PageError::Email(_) => "We were unable to send you an email. Please try again later.",
            _ => "We were unable to process your request. Please try again later.",
        };
        render_error_page(message, Some(self))
    }
}
