use actix_web::HttpResponse;

use crate::pages::render_not_found_page;

pub async fn not_found() -> HttpResponse {
    render_not_found_page("The page you were looking for doesn't exist.")
}
