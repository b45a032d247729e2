//! Login credentials shared by discovery, SuiteTalk and sdfcli

use nsdeploy_config::DeployConfig;

/// NetSuite login
#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub email: String,
    pub password: String,
    /// Internal id of the login role
    pub role: String,
}

impl Credentials {
    pub fn new(
        account: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        Self::new(
            config.account.clone(),
            config.email.clone(),
            config.password.clone(),
            config.role.clone(),
        )
    }

    /// `Authorization` header value for the REST roles service
    pub fn nlauth_header(&self) -> String {
        format!(
            "NLAuth nlauth_account={}, nlauth_email={}, nlauth_signature={}",
            self.account, self.email, self.password
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("email", &self.email)
            .field("password", &"******")
            .field("role", &self.role)
            .finish()
    }
}
