use actix_web::http::StatusCode;
use actix_web::test::{call_service, init_service, TestRequest};
use actix_web::{web, App, HttpResponse};
use actix_web_lab::middleware::from_fn;

use hippo::domain::{TenantName, UserEmail};
use hippo::models::Tenant;
use hippo::request_transaction::{transaction_per_request, RequestTransaction};

use crate::helpers::spawn_app;

/// Writes a tenant, then answers with whatever status the path asks for.
async fn insert_tenant_then_respond(
    status: web::Path<u16>,
    transaction: RequestTransaction,
) -> HttpResponse {
    let mut transaction = transaction
        .acquire()
        .await
        .expect("The request has no transaction.");
    Tenant::insert(
        &mut transaction,
        &TenantName::parse("Kargad Lands".into()).unwrap(),
        &UserEmail::parse("kargad@example.com".into()).unwrap(),
    )
    .await
    .expect("Failed to insert the tenant.");
    HttpResponse::build(StatusCode::from_u16(status.into_inner()).unwrap()).finish()
}

async fn tenant_count_after_responding_with(status: u16) -> i64 {
    let app = spawn_app().await;
    let service = init_service(
        App::new()
            .app_data(web::Data::new(app.connection_pool.clone()))
            .service(
                web::scope("")
                    .wrap(from_fn(transaction_per_request))
                    .route("/respond/{status}", web::post().to(insert_tenant_then_respond)),
            ),
    )
    .await;

    let response = call_service(
        &service,
        TestRequest::post()
            .uri(&format!("/respond/{}", status))
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), status);

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tenants WHERE name = 'Kargad Lands'")
            .fetch_one(&app.connection_pool)
            .await
            .expect("Failed to count tenants.");
    count
}

#[actix_web::test]
async fn writes_are_committed_for_successful_and_redirect_responses() {
    for status in [200, 303, 399] {
        assert_eq!(
            tenant_count_after_responding_with(status).await,
            1,
            "The write was not committed for a {} response.",
            status
        );
    }
}

#[actix_web::test]
async fn writes_are_rolled_back_for_client_errors() {
    for status in [400, 401, 404, 422] {
        assert_eq!(
            tenant_count_after_responding_with(status).await,
            0,
            "The write was not rolled back for a {} response.",
            status
        );
    }
}

#[actix_web::test]
async fn writes_are_rolled_back_for_server_errors() {
    assert_eq!(tenant_count_after_responding_with(503).await, 0);
}
