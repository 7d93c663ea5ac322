mod tenant;
mod user;

pub use tenant::Tenant;
pub use user::{NewUser, User};
