use std::net::TcpListener;

use anyhow::Context;

use hippo::configuration::get_configuration;
use hippo::email_client::EmailClient;
use hippo::startup::{get_connection_pool, run};
use hippo::telemetry::{get_tracing_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_tracing_subscriber("hippo", "info", std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let connection_pool = get_connection_pool(&configuration.database);

    let sender_email = configuration
        .email_client
        .sender()
        .map_err(anyhow::Error::msg)
        .context("Invalid sender email address.")?;
    let timeout = configuration.email_client.timeout();
    let email_client = EmailClient::new(
        configuration.email_client.base_url,
        sender_email,
        configuration.email_client.authorization_token,
        timeout,
    )?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Running application on {}", address);
    let listener = TcpListener::bind(address)?;
    run(
        listener,
        connection_pool,
        email_client,
        configuration.application,
        configuration.graphql,
    )?
    .await?;
    Ok(())
}
