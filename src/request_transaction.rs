//! One database transaction per request.
//!
//! [`transaction_per_request`] begins a transaction before the handler runs and settles it once the
//! response is known: statuses below 400 commit, everything else rolls back. Handlers reach the
//! transaction through the [`RequestTransaction`] extractor.

use std::fmt::{Debug, Formatter};
use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use actix_web_lab::middleware::Next;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error_handling::error_chain_fmt;
use crate::pages::render_error_page;

pub type PgTransaction = Transaction<'static, Postgres>;

/// What happens to a request's transaction once its response status is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Commit,
    Rollback,
}

impl TransactionOutcome {
    pub fn for_status(status: StatusCode) -> Self {
        if status.as_u16() >= 400 {
            TransactionOutcome::Rollback
        } else {
            TransactionOutcome::Commit
        }
    }
}

#[derive(thiserror::Error)]
pub enum TransactionError {
    #[error("No database transaction is attached to this request.")]
    Missing,
    #[error("The request's database transaction has already been settled.")]
    Settled,
    #[error("Failed to begin a database transaction.")]
    Begin(#[source] sqlx::Error),
    #[error("Failed to commit the database transaction.")]
    Commit(#[source] sqlx::Error),
}

impl Debug for TransactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for TransactionError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        render_error_page(
            "We were unable to process your request. Please try again later.",
            Some(self),
        )
    }
}

/// The transaction owned by the current request.
///
/// Cloning is cheap and every clone refers to the same transaction; the middleware takes it back
/// out once the handler has produced a response.
#[derive(Clone)]
pub struct RequestTransaction(Arc<Mutex<Option<PgTransaction>>>);

impl RequestTransaction {
    fn new(transaction: PgTransaction) -> Self {
        Self(Arc::new(Mutex::new(Some(transaction))))
    }

    /// Locks the transaction for as long as the returned guard lives.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, PgTransaction>, TransactionError> {
        let guard = self.0.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_mut()).map_err(|_| TransactionError::Settled)
    }

    async fn take(&self) -> Option<PgTransaction> {
        self.0.lock().await.take()
    }
}

impl FromRequest for RequestTransaction {
    type Error = TransactionError;
    type Future = Ready<Result<RequestTransaction, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<RequestTransaction>()
                .cloned()
                .ok_or(TransactionError::Missing),
        )
    }
}

/// Middleware wrapping every request in a database transaction. Register with
/// `actix_web_lab::middleware::from_fn(transaction_per_request)` on an app that holds a
/// `web::Data<PgPool>`.
pub async fn transaction_per_request(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let pool = match req.app_data::<web::Data<PgPool>>() {
        Some(pool) => pool.clone(),
        None => {
            tracing::error!("No connection pool is registered; cannot begin a transaction");
            return Ok(req.error_response(TransactionError::Missing));
        }
    };
    let transaction = match pool.begin().await {
        Ok(transaction) => transaction,
        Err(e) => return Ok(req.error_response(TransactionError::Begin(e))),
    };

    let request_transaction = RequestTransaction::new(transaction);
    req.extensions_mut().insert(request_transaction.clone());

    let result = next.call(req).await;
    // the handler may have settled it already; whatever is left is ours to finish
    let transaction = request_transaction.take().await;

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            if let Some(transaction) = transaction {
                tracing::warn!("Transaction is being rolled back; the request failed");
                rollback(transaction).await;
            }
            return Err(e);
        }
    };

    let transaction = match transaction {
        Some(transaction) => transaction,
        None => return Ok(response.map_into_boxed_body()),
    };

    let status = response.status();
    match TransactionOutcome::for_status(status) {
        TransactionOutcome::Commit => {
            if let Err(e) = transaction.commit().await {
                let (request, _) = response.into_parts();
                let error = TransactionError::Commit(e);
                return Ok(ServiceResponse::new(request, error.error_response()));
            }
        }
        TransactionOutcome::Rollback => {
            tracing::warn!(
                status = status.as_u16(),
                "Transaction is being rolled back"
            );
            rollback(transaction).await;
        }
    }
    Ok(response.map_into_boxed_body())
}

async fn rollback(transaction: PgTransaction) {
    if let Err(e) = transaction.rollback().await {
        tracing::error!(error.cause_chain = ?e, "Failed to roll back the database transaction");
    }
}
