use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_lab::middleware::from_fn;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::{ApplicationSettings, DatabaseSettings, GraphqlSettings};
use crate::email_client::EmailClient;
use crate::proxy::{graphql_routes, GraphqlProxy};
use crate::request_transaction::transaction_per_request;
use crate::routes::{
    health_check, home, login, login_with_token, not_found, password_reset_form,
    request_password_reset, reset_password, send_login_link, signup,
};

/// A pool that connects on first use, so the server starts even while the database is down.
pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn run(
    listener: TcpListener,
    connection_pool: PgPool,
    email_client: EmailClient,
    settings: ApplicationSettings,
    graphql: GraphqlSettings,
) -> Result<Server, anyhow::Error> {
    let proxy = web::Data::new(GraphqlProxy::new(&graphql)?);
    // wrap shared state in smart pointers so every worker can clone it
    let connection_pool = web::Data::new(connection_pool);
    let email_client = web::Data::new(email_client);
    let settings = web::Data::new(settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            // graphql traffic is the engine's business, it never touches our transaction
            .configure(|cfg| graphql_routes(cfg, &graphql))
            .service(
                web::scope("")
                    .wrap(from_fn(transaction_per_request))
                    .route("/", web::get().to(home))
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/login/email", web::post().to(send_login_link))
                    .route("/login/{token}", web::get().to(login_with_token))
                    .route("/forgot-password", web::post().to(request_password_reset))
                    .route("/forgot-password/{token}", web::get().to(password_reset_form))
                    .route("/forgot-password/{token}", web::post().to(reset_password))
                    .default_service(web::route().to(not_found)),
            )
            .app_data(connection_pool.clone())
            .app_data(email_client.clone())
            .app_data(settings.clone())
            .app_data(proxy.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
