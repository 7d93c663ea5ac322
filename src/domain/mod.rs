mod display_name;
mod new_password;
mod new_signup;
mod user_email;

pub use display_name::{TenantName, UserName};
pub use new_password::NewPassword;
pub use new_signup::{NewSignup, SignupData};
pub use user_email::UserEmail;
