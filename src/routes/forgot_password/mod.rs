mod get;
mod post;
mod request;

pub use get::*;
pub use post::*;
pub use request::*;

/// How long an emailed reset link stays usable.
fn reset_token_lifetime() -> chrono::Duration {
    chrono::Duration::hours(1)
}

const INVALID_RESET_LINK: &str = "That password reset link is invalid or has expired.";
