use serde::{Deserialize, Serialize};

use super::{require, ValidationError, MIN_PASSWORD_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RegisterRequest {
    /// Build a request from raw form input. A blank name is treated as absent.
    pub fn new(email: impl Into<String>, password: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Summary of the authenticated user. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserSummary {
    /// Name if the server supplied one, otherwise the email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_blank_name_is_omitted() {
        let req = RegisterRequest::new("a@b.com", "secret1", Some("  ".to_string()));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"email": "a@b.com", "password": "secret1"}));
    }

    #[test]
    fn test_register_validation() {
        assert!(RegisterRequest::new("a@b.com", "secret1", None).validate().is_ok());
        assert_eq!(
            RegisterRequest::new("", "secret1", None).validate(),
            Err(ValidationError::Required("Email"))
        );
        assert_eq!(
            RegisterRequest::new("a@b.com", "12345", None).validate(),
            Err(ValidationError::PasswordTooShort)
        );
        // Exactly the minimum is accepted
        assert!(RegisterRequest::new("a@b.com", "123456", None).validate().is_ok());
    }

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{"accessToken":"tok123","user":{"id":1,"email":"a@b.com"}}"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "tok123");
        assert_eq!(resp.user.id, 1);
        assert_eq!(resp.user.name, None);
        assert_eq!(resp.user.display_name(), "a@b.com");
    }
}
