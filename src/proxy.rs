//! Passes requests for the graphql endpoint through to the graphql engine listening locally.

use actix_web::http::{Method, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

use crate::configuration::GraphqlSettings;
use crate::cors::{allow_cors_reply, insert_cors_headers};
use crate::error_handling::error_chain_fmt;

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_forwardable(name: &str) -> bool {
    // the client library recomputes host and content length for the outgoing request
    !HOP_BY_HOP_HEADERS.contains(&name) && name != "host" && name != "content-length"
}

#[derive(thiserror::Error)]
pub enum ProxyError {
    #[error("The graphql engine could not be reached.")]
    Upstream(#[from] reqwest::Error),
}

impl std::fmt::Debug for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }
}

pub struct GraphqlProxy {
    http_client: reqwest::Client,
    target: String,
}

impl GraphqlProxy {
    pub fn new(settings: &GraphqlSettings) -> Result<Self, reqwest::Error> {
        // redirects are the client's business, hand them back untouched
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http_client,
            target: settings.target(),
        })
    }

    fn upstream_url(&self, request: &HttpRequest) -> String {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        format!("http://{}{}", self.target, path_and_query)
    }

    #[tracing::instrument(
        name = "Proxying request to the graphql engine",
        skip(self, request, body),
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn forward(
        &self,
        request: &HttpRequest,
        body: web::Bytes,
    ) -> Result<HttpResponse, ProxyError> {
        let mut upstream_request = self
            .http_client
            .request(request.method().clone(), self.upstream_url(request))
            .body(body);

        for (name, value) in request.headers() {
            if is_forwardable(name.as_str()) {
                upstream_request = upstream_request.header(name.as_str(), value.as_bytes());
            }
        }
        if let Some(peer) = request.peer_addr() {
            let forwarded_for = match request.headers().get("x-forwarded-for") {
                Some(prior) => format!(
                    "{}, {}",
                    String::from_utf8_lossy(prior.as_bytes()),
                    peer.ip()
                ),
                None => peer.ip().to_string(),
            };
            upstream_request = upstream_request.header("x-forwarded-for", forwarded_for);
        }

        let upstream_response = upstream_request.send().await?;

        let status = StatusCode::from_u16(upstream_response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = HttpResponse::build(status);
        for (name, value) in upstream_response.headers() {
            if is_forwardable(name.as_str()) {
                response.append_header((name.as_str().to_owned(), value.as_bytes().to_owned()));
            }
        }
        insert_cors_headers(&mut response);
        let body = upstream_response.bytes().await?;
        Ok(response.body(body))
    }
}

/// Handler for every route under the graphql path.
pub async fn reverse_proxy(
    request: HttpRequest,
    body: web::Bytes,
    proxy: web::Data<GraphqlProxy>,
) -> Result<HttpResponse, ProxyError> {
    proxy.forward(&request, body).await.map_err(|e| {
        tracing::error!(error.cause_chain = ?e, "Failed to proxy request");
        e
    })
}

/// Mounts the graphql path and everything below it. Preflight requests are answered here,
/// the rest goes to the engine.
pub fn graphql_routes(cfg: &mut web::ServiceConfig, settings: &GraphqlSettings) {
    let patterns = vec![
        settings.path.clone(),
        format!("{}/{{tail:.*}}", settings.path.trim_end_matches('/')),
    ];
    cfg.service(
        web::resource(patterns)
            .app_data(web::PayloadConfig::new(settings.max_body_bytes))
            .route(web::method(Method::OPTIONS).to(allow_cors_reply))
            .route(web::route().to(reverse_proxy)),
    );
}
