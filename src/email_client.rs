use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};

use crate::domain::UserEmail;

pub struct EmailClient {
    sender: UserEmail,
    http_client: Client,
    email_url: Url,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: UserEmail,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let email_url = Url::parse(&base_url)?.join("/email")?;
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            email_url,
            sender,
            authorization_token,
        })
    }

    /// Sends one email through the delivery API.
    ///
    /// `recipient` may carry a display name (`"Name" <address>`); replies go to `reply_to`
    /// when set.
    #[tracing::instrument(name = "Sending email", skip(self, html_content, text_content))]
    pub async fn send_email(
        &self,
        recipient: &str,
        reply_to: Option<&str>,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), reqwest::Error> {
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient,
            reply_to,
            subject,
            html_body: html_content,
            text_body: text_content,
        };

        self.http_client
            .post(self.email_url.clone())
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            // `send` succeeds on any status the server returns
            .error_for_status()?;

        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}
