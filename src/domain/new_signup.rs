use secrecy::{ExposeSecret, Secret};

use crate::domain::{NewPassword, TenantName, UserEmail, UserName};

/// The signup form as submitted; echoed back into the home page when it fails validation.
#[derive(serde::Deserialize, Debug, Default)]
pub struct SignupData {
    pub name: String,
    pub email: String,
    pub tenant: String,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

#[derive(Debug)]
pub struct NewSignup {
    pub name: UserName,
    pub email: UserEmail,
    pub tenant: TenantName,
    pub password: Option<NewPassword>,
}

impl TryFrom<&SignupData> for NewSignup {
    type Error = String;

    fn try_from(form: &SignupData) -> Result<Self, Self::Error> {
        let name = UserName::parse(form.name.clone())?;
        let email = UserEmail::parse(form.email.clone())?;
        let tenant = TenantName::parse(form.tenant.clone())?;
        // signups without a password log in through emailed links only
        let password = form
            .password
            .clone()
            .filter(|password| !password.expose_secret().is_empty())
            .map(NewPassword::parse)
            .transpose()?;
        Ok(NewSignup {
            name,
            email,
            tenant,
            password,
        })
    }
}
