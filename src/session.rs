use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_USERNAME_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Username is required")]
    MissingUsername,
    #[error("Username must be at least {MIN_USERNAME_CHARS} characters")]
    UsernameTooShort,
}

/// Durable auth record. Username-only: there is no secret to check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
}

impl AuthRecord {
    pub fn login(&mut self, raw: &str) -> Result<(), AuthError> {
        let username = raw.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        if username.chars().count() < MIN_USERNAME_CHARS {
            return Err(AuthError::UsernameTooShort);
        }
        self.is_authenticated = true;
        self.username = Some(username.to_string());
        Ok(())
    }

    pub fn logout(&mut self) {
        self.is_authenticated = false;
        self.username = None;
    }

    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("guest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_trims_and_validates() {
        let mut auth = AuthRecord::default();
        assert_eq!(auth.login("   "), Err(AuthError::MissingUsername));
        assert_eq!(auth.login(" ab "), Err(AuthError::UsernameTooShort));
        assert!(!auth.is_authenticated);

        auth.login("  jordan ").expect("valid username");
        assert!(auth.is_authenticated);
        assert_eq!(auth.username.as_deref(), Some("jordan"));

        auth.logout();
        assert_eq!(auth, AuthRecord::default());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut auth = AuthRecord::default();
        auth.login("magic").expect("valid username");
        let json = serde_json::to_string(&auth).expect("serialize");
        assert_eq!(json, r#"{"isAuthenticated":true,"username":"magic"}"#);
    }
}
