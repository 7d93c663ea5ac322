//! Server rendered pages: `error.html`, `not-found.html`, `home.html`, `application.html` and the
//! password reset form.

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use htmlescape::{encode_attribute, encode_minimal};

use crate::bootstrap::{bootstrap_data, BootstrapError};
use crate::configuration::ApplicationSettings;
use crate::domain::SignupData;
use crate::models::User;

fn layout(status: StatusCode, title: &str, body: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
</head>
<body>
{body}
</body>
</html>"#,
            title = encode_minimal(title),
        ))
}

fn paragraph(class: &str, message: Option<&str>) -> String {
    match message {
        Some(message) => format!(r#"<p class="{}"><i>{}</i></p>"#, class, encode_minimal(message)),
        None => String::new(),
    }
}

/// `error.html`: a generic message for the user, the details go to the logs.
pub fn render_error_page(message: &str, error: Option<&dyn std::fmt::Debug>) -> HttpResponse {
    if let Some(error) = error {
        tracing::error!(error.cause_chain = ?error, "Error occurred: {}", message);
    }
    layout(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error",
        &format!(
            r#"    <h1>Something went wrong</h1>
    <p class="message">{}</p>
    <p><a href="/">Return home</a></p>"#,
            encode_minimal(message)
        ),
    )
}

/// `not-found.html`
pub fn render_not_found_page(message: &str) -> HttpResponse {
    layout(
        StatusCode::NOT_FOUND,
        "Not Found",
        &format!(
            r#"    <h1>Not Found</h1>
    <p class="message">{}</p>
    <p><a href="/">Return home</a></p>"#,
            encode_minimal(message)
        ),
    )
}

/// What `home.html` shows besides its forms.
#[derive(Default)]
pub struct Homepage<'a> {
    /// The previous signup attempt, used to pre-fill the form.
    pub signup: Option<&'a SignupData>,
    pub error: Option<&'a str>,
    pub notice: Option<&'a str>,
}

/// `home.html`: login, login-by-email, signup and password recovery forms.
pub fn render_homepage(status: StatusCode, page: Homepage<'_>) -> HttpResponse {
    let (name, email, tenant) = match page.signup {
        Some(signup) => (
            encode_attribute(&signup.name),
            encode_attribute(&signup.email),
            encode_attribute(&signup.tenant),
        ),
        None => Default::default(),
    };
    let error_html = paragraph("error", page.error);
    let notice_html = paragraph("notice", page.notice);
    layout(
        status,
        "Welcome",
        &format!(
            r#"    {error_html}
    {notice_html}
    <h2>Log in</h2>
    <form action="/login" method="post">
        <label>Email <input type="email" name="email" placeholder="Enter Email"></label>
        <label>Password <input type="password" name="password" placeholder="Enter Password"></label>
        <button type="submit">Login</button>
    </form>
    <form action="/login/email" method="post">
        <label>Email me a login link <input type="email" name="email" placeholder="Enter Email"></label>
        <button type="submit">Send link</button>
    </form>
    <form action="/forgot-password" method="post">
        <label>Forgot your password? <input type="email" name="email" placeholder="Enter Email"></label>
        <button type="submit">Reset password</button>
    </form>
    <h2>Sign up</h2>
    <form action="/signup" method="post">
        <label>Name <input type="text" name="name" value="{name}"></label>
        <label>Email <input type="email" name="email" value="{email}"></label>
        <label>Organization <input type="text" name="tenant" value="{tenant}"></label>
        <label>Password (optional) <input type="password" name="password"></label>
        <button type="submit">Sign up</button>
    </form>"#,
        ),
    )
}

/// `application.html`: the client shell, started from the embedded bootstrap data.
pub fn render_application(
    user: &User,
    settings: &ApplicationSettings,
) -> Result<HttpResponse, BootstrapError> {
    let bootstrap = bootstrap_data(user, settings)?;
    Ok(layout(
        StatusCode::OK,
        &settings.product_name,
        &format!(
            r#"    <div id="root"></div>
    <script>
        window.bootstrapData = {bootstrap};
    </script>
    <script src="/assets/application.js"></script>"#,
        ),
    ))
}

/// The form behind an emailed password reset link.
pub fn render_password_reset_page(
    status: StatusCode,
    token: &str,
    error: Option<&str>,
) -> HttpResponse {
    let error_html = paragraph("error", error);
    let action = encode_attribute(&format!("/forgot-password/{}", token));
    layout(
        status,
        "Reset Password",
        &format!(
            r#"    {error_html}
    <form action="{action}" method="post">
        <label>New password <input type="password" name="password"></label>
        <label>Confirm new password <input type="password" name="password_check"></label>
        <button type="submit">Change password</button>
    </form>"#,
        ),
    )
}
