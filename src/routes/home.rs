use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use crate::pages::{render_homepage, Homepage};

pub async fn home() -> HttpResponse {
    render_homepage(StatusCode::OK, Homepage::default())
}
