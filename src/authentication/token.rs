use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::ApplicationSettings;
use crate::domain::UserEmail;
use crate::models::{Tenant, User};

const GRAPHQL_TOKEN_LIFETIME_HOURS: i64 = 24;
const LOGIN_TOKEN_LIFETIME_HOURS: i64 = 1;
const LOGIN_AUDIENCE: &str = "login";

/// Claims handed to the graphql engine. Authorization rules there key off the namespaced
/// `x-hasura-*` values.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphqlClaims {
    pub sub: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "https://hasura.io/jwt/claims")]
    pub graphql: GraphqlRoleClaims,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphqlRoleClaims {
    #[serde(rename = "x-hasura-default-role")]
    pub default_role: String,
    #[serde(rename = "x-hasura-allowed-roles")]
    pub allowed_roles: Vec<String>,
    #[serde(rename = "x-hasura-user-id")]
    pub user_id: String,
    #[serde(rename = "x-hasura-org-id")]
    pub tenant_id: String,
}

/// Claims of the short-lived token embedded in emailed login links.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginClaims {
    /// The address the link was sent to.
    pub sub: String,
    pub tenant: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

fn encoding_key(settings: &ApplicationSettings) -> EncodingKey {
    EncodingKey::from_secret(settings.jwt_secret.expose_secret().as_bytes())
}

fn decoding_key(settings: &ApplicationSettings) -> DecodingKey {
    DecodingKey::from_secret(settings.jwt_secret.expose_secret().as_bytes())
}

/// Mints the access token the browser client presents to the graphql endpoint.
pub fn jwt_for_user(
    user: &User,
    settings: &ApplicationSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let mut allowed_roles = vec!["user".to_string()];
    if user.role != "user" {
        allowed_roles.push(user.role.clone());
    }
    let claims = GraphqlClaims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(GRAPHQL_TOKEN_LIFETIME_HOURS)).timestamp(),
        graphql: GraphqlRoleClaims {
            default_role: user.role.clone(),
            allowed_roles,
            user_id: user.id.to_string(),
            tenant_id: user.tenant_id.to_string(),
        },
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &encoding_key(settings),
    )
}

pub fn login_token(
    email: &UserEmail,
    tenant: &Tenant,
    settings: &ApplicationSettings,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = LoginClaims {
        sub: email.as_ref().to_string(),
        tenant: tenant.id,
        aud: LOGIN_AUDIENCE.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(LOGIN_TOKEN_LIFETIME_HOURS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &encoding_key(settings),
    )
}

/// Verifies signature, expiry and audience of a login link token.
pub fn decode_login_token(
    token: &str,
    settings: &ApplicationSettings,
) -> Result<LoginClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[LOGIN_AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "aud", "sub"]);
    decode::<LoginClaims>(token, &decoding_key(settings), &validation).map(|data| data.claims)
}

/// Generates a random 25-character password reset token
pub fn generate_reset_token() -> String {
    let mut rng = thread_rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .map(char::from)
        .take(25)
        .collect()
}
