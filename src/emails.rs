//! Transactional emails: password resets and login links.

use htmlescape::encode_minimal;
use sqlx::{Postgres, Transaction};

use crate::authentication::login_token;
use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::email_client::EmailClient;
use crate::error_handling::error_chain_fmt;
use crate::models::{Tenant, User};

#[derive(thiserror::Error)]
pub enum EmailError {
    #[error("The email has no recipient.")]
    MissingRecipient,
    #[error("Failed to load the tenant the email is sent on behalf of.")]
    Tenant(#[source] sqlx::Error),
    #[error("Failed to create the login token.")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Failed to deliver the email.")]
    Delivery(#[from] reqwest::Error),
}

impl std::fmt::Debug for EmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Default)]
pub struct EmailBody {
    pub html: String,
    pub text: String,
}

/// An email sent on behalf of a tenant: replies go to the tenant's contact address.
pub struct EmailMessage<'a> {
    client: &'a EmailClient,
    reply_to: String,
    to: Option<String>,
    subject: String,
    pub body: EmailBody,
}

impl<'a> EmailMessage<'a> {
    pub fn new(tenant: &Tenant, client: &'a EmailClient) -> Self {
        Self {
            client,
            reply_to: tenant.email.clone(),
            to: None,
            subject: String::new(),
            body: EmailBody::default(),
        }
    }

    /// Addresses the email; `name` may be empty.
    pub fn set_to(&mut self, email: &str, name: &str) {
        let to = if name.is_empty() {
            email.to_string()
        } else {
            format!("\"{}\" <{}>", name.replace('"', ""), email)
        };
        self.to = Some(to);
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub async fn deliver(self) -> Result<(), EmailError> {
        let to = self.to.as_deref().ok_or(EmailError::MissingRecipient)?;
        self.client
            .send_email(
                to,
                Some(self.reply_to.as_str()),
                &self.subject,
                &self.body.html,
                &self.body.text,
            )
            .await?;
        Ok(())
    }
}

fn password_reset_email(user: &User, link: &str, settings: &ApplicationSettings) -> EmailBody {
    EmailBody {
        html: format!(
            "<p>Hello {name},</p>\
            <p>Someone asked to reset the password of your {product} account. \
            Click <a href=\"{link}\">here</a> to choose a new one.</p>\
            <p>If it wasn't you, you can ignore this email.</p>",
            name = encode_minimal(&user.name),
            product = encode_minimal(&settings.product_name),
            link = link,
        ),
        text: format!(
            "Hello {name},\n\
            Someone asked to reset the password of your {product} account. \
            Visit {link} to choose a new one.\n\
            If it wasn't you, you can ignore this email.",
            name = user.name,
            product = settings.product_name,
            link = link,
        ),
    }
}

fn login_email(tenant: &Tenant, link: &str, settings: &ApplicationSettings) -> EmailBody {
    EmailBody {
        html: format!(
            "<p>Welcome to {product}!</p>\
            <p>Click <a href=\"{link}\">here</a> to log in to {tenant}. \
            The link is valid for one hour.</p>",
            product = encode_minimal(&settings.product_name),
            tenant = encode_minimal(&tenant.name),
            link = link,
        ),
        text: format!(
            "Welcome to {product}!\n\
            Visit {link} to log in to {tenant}. The link is valid for one hour.",
            product = settings.product_name,
            tenant = tenant.name,
            link = link,
        ),
    }
}

#[tracing::instrument(
    name = "Send a password reset email",
    skip(user, token, transaction, settings, client),
    fields(user_id = %user.id)
)]
pub async fn deliver_reset_email(
    user: &User,
    token: &str,
    transaction: &mut Transaction<'_, Postgres>,
    settings: &ApplicationSettings,
    client: &EmailClient,
) -> Result<(), EmailError> {
    let tenant = user.tenant(transaction).await.map_err(EmailError::Tenant)?;
    let link = format!("{}/forgot-password/{}", settings.base_url, token);
    let mut email = EmailMessage::new(&tenant, client);
    email.body = password_reset_email(user, &link, settings);
    email.set_to(&user.email, &user.name);
    email.set_subject(format!("Password Reset for {}", settings.product_name));
    email.deliver().await
}

#[tracing::instrument(
    name = "Send a login link",
    skip(email_address, tenant, settings, client),
    fields(tenant_id = %tenant.id)
)]
pub async fn deliver_login_email(
    email_address: &UserEmail,
    tenant: &Tenant,
    settings: &ApplicationSettings,
    client: &EmailClient,
) -> Result<(), EmailError> {
    let token = login_token(email_address, tenant, settings)?;
    let link = format!("{}/login/{}", settings.base_url, token);
    let mut email = EmailMessage::new(tenant, client);
    email.body = login_email(tenant, &link, settings);
    email.set_to(email_address.as_ref(), "");
    email.set_subject(format!("Login to {}", settings.product_name));
    email.deliver().await
}
