//! Expected format of the arguments sent to the auth backend

use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

#[derive(serde::Deserialize, Clone)]
pub struct LoginReqArgs {
    pub username: String,
    pub password: SecretString,
    /// Some backends serve multiple tenants from one login endpoint
    pub tenant_id: Option<String>,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(username: S, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            tenant_id: None,
        }
    }

    pub fn tenant_id(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Builds the request body. Only call at the point of sending as it
    /// exposes the password.
    pub fn to_json_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "password": self.password.expose_secret(),
            "tenant_id": self.tenant_id,
        })
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("username", &self.username)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_password() {
        let args = LoginReqArgs::new("admin", "hunter2".to_string().into());
        let text = format!("{args:?}");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("has_password: true"));
    }

    #[test]
    fn body_contains_credentials() {
        let args = LoginReqArgs::new("admin", "hunter2".to_string().into())
            .tenant_id(Some("000000".to_string()));

        let body = args.to_json_body();

        assert_eq!(body["username"], "admin");
        assert_eq!(body["password"], "hunter2");
        assert_eq!(body["tenant_id"], "000000");
    }
}
