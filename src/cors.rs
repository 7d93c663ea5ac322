use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, HttpResponseBuilder};

/// Headers that let browsers on any origin call the graphql endpoint with credentials.
pub const CORS_HEADERS: [(&str, &str); 5] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Max-Age", "86400"),
    (
        "Access-Control-Allow-Methods",
        "POST, GET, OPTIONS, PUT, DELETE, UPDATE",
    ),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization, X-Max, X-HASURA-ACCESS-KEY",
    ),
    ("Access-Control-Allow-Credentials", "true"),
];

pub fn insert_cors_headers(builder: &mut HttpResponseBuilder) {
    for header in CORS_HEADERS {
        builder.insert_header(header);
    }
}

/// Answers a CORS preflight request.
pub async fn allow_cors_reply() -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.content_type(ContentType::json());
    insert_cors_headers(&mut builder);
    builder.finish()
}
