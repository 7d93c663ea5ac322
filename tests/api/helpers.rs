use std::net::TcpListener;

use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, Secret};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;

use hippo::authentication::compute_password_hash;
use hippo::configuration::{get_configuration, DatabaseSettings};
use hippo::email_client::EmailClient;
use hippo::telemetry::{get_tracing_subscriber, init_subscriber};

// ensure that the tracing stack is only initialized once
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_tracing_subscriber("test", "debug", std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_tracing_subscriber("test", "debug", std::io::sink);
        init_subscriber(subscriber);
    }
});

/// Links found in an email sent through the mock delivery API.
pub struct EmailLinks {
    pub html: reqwest::Url,
    pub plain_text: reqwest::Url,
}

// A struct holding data needed to access a test version of our application
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub connection_pool: PgPool,
    pub email_server: MockServer,
    pub graphql_server: MockServer,
    pub test_user: TestUser,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get_homepage(&self) -> reqwest::Response {
        self.api_client
            .get(&format!("{}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_signup<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/signup", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/login", &self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login_email(&self, email: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/login/email", &self.address))
            .form(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_forgot_password(&self, email: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/forgot-password", &self.address))
            .form(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, url: reqwest::Url) -> reqwest::Response {
        self.api_client
            .get(url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form<Body>(&self, url: reqwest::Url, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(url)
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Extracts the link embedded in an email sent through the mock delivery API.
    pub fn get_email_links(&self, email_request: &wiremock::Request) -> EmailLinks {
        let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();

        let get_link = |s: &str| {
            let links: Vec<_> = linkify::LinkFinder::new()
                .links(s)
                .filter(|l| *l.kind() == linkify::LinkKind::Url)
                .collect();
            assert_eq!(links.len(), 1);
            let raw_link = links[0].as_str().to_owned();
            let mut link = reqwest::Url::parse(&raw_link).unwrap();
            // make sure we only ever call our own server
            assert_eq!(link.host_str().unwrap(), "127.0.0.1");
            link.set_port(Some(self.port)).unwrap();
            link
        };

        let html = get_link(body["HtmlBody"].as_str().unwrap());
        let plain_text = get_link(body["TextBody"].as_str().unwrap());
        EmailLinks { html, plain_text }
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.connection_pool)
            .await
            .expect("Failed to count rows.");
        count
    }
}

pub struct TestUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub fn generate() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Tenar".into(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password: Uuid::new_v4().to_string(),
        }
    }

    async fn store(&self, pool: &PgPool) {
        let password_digest = compute_password_hash(Secret::new(self.password.clone()))
            .expect("Failed to hash the test password.");
        sqlx::query(
            "INSERT INTO tenants (id, name, identifier, email) VALUES ($1, $2, $3, $4)",
        )
        .bind(self.tenant_id)
        .bind("Atuan")
        .bind(format!("atuan-{}", self.tenant_id.simple()))
        .bind(&self.email)
        .execute(pool)
        .await
        .expect("Failed to store test tenant.");
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, name, email, role, password_digest)
            VALUES ($1, $2, $3, $4, 'admin', $5)
            "#,
        )
        .bind(self.user_id)
        .bind(self.tenant_id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(password_digest.expose_secret())
        .execute(pool)
        .await
        .expect("Failed to store test user.");
    }
}

// Spawns an app inside a future and returns the configured TestApp.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let graphql_server = MockServer::start().await;

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind a random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.database.database_name = Uuid::new_v4().to_string();
        c.application.base_url = address.clone();
        c.email_client.base_url = email_server.uri();
        c.graphql.host = "127.0.0.1".into();
        c.graphql.port = graphql_server.address().port();
        c
    };

    let connection_pool = configure_database(&configuration.database).await;

    let sender_email = configuration
        .email_client
        .sender()
        .expect("Invalid sender email address.");
    let email_client = EmailClient::new(
        configuration.email_client.base_url,
        sender_email,
        configuration.email_client.authorization_token,
        std::time::Duration::from_millis(200),
    )
    .expect("Failed to build the email client.");

    let server = hippo::startup::run(
        listener,
        connection_pool.clone(),
        email_client,
        configuration.application,
        configuration.graphql,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    let test_user = TestUser::generate();
    test_user.store(&connection_pool).await;

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        port,
        connection_pool,
        email_server,
        graphql_server,
        test_user,
        api_client,
    }
}

// Configures a test database, running all migrations, and then returning the connection pool handle
// needed to use the test database.
async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to postgres.");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database");

    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to postgres.");

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
