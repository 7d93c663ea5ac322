use secrecy::{ExposeSecret, Secret};

const MIN_LENGTH: usize = 12;
const MAX_LENGTH: usize = 128;

#[derive(Debug)]
pub struct NewPassword(Secret<String>);

impl NewPassword {
    pub fn parse(password: Secret<String>) -> Result<NewPassword, String> {
        let length = password.expose_secret().chars().count();
        if length <= MIN_LENGTH {
            return Err(format!("Password must be at least {} characters.", MIN_LENGTH));
        }
        if length > MAX_LENGTH {
            return Err(format!(
                "Password must be no more than {} characters.",
                MAX_LENGTH
            ));
        }
        Ok(Self(password))
    }

    pub fn into_inner(self) -> Secret<String> {
        self.0
    }
}
