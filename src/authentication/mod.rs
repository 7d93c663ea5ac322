mod password;
mod token;

pub use password::{
    change_password, compute_password_hash, validate_credentials, AuthError, Credentials,
};
pub use token::{
    decode_login_token, generate_reset_token, jwt_for_user, login_token, GraphqlClaims,
    LoginClaims,
};
