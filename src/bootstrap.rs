use serde::Serialize;

use crate::authentication::jwt_for_user;
use crate::configuration::ApplicationSettings;
use crate::models::User;

#[derive(thiserror::Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to sign the graphql access token.")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Failed to serialize bootstrap data.")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapData<'a> {
    server_url: &'a str,
    user: &'a User,
    graphql: GraphqlEndpoint<'a>,
}

#[derive(Serialize)]
struct GraphqlEndpoint<'a> {
    token: String,
    endpoint: &'a str,
}

/// JSON the browser client starts from, ready to be placed inside a `<script>` element.
pub fn bootstrap_data(
    user: &User,
    settings: &ApplicationSettings,
) -> Result<String, BootstrapError> {
    let data = BootstrapData {
        server_url: &settings.base_url,
        user,
        graphql: GraphqlEndpoint {
            token: jwt_for_user(user, settings)?,
            endpoint: &settings.base_url,
        },
    };
    let json = serde_json::to_string(&data)?;
    // `</script>` inside a string literal would still close the element
    Ok(json.replace("</", "<\\/"))
}
