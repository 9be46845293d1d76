//! User account models

use serde::{Deserialize, Serialize};

/// A registered user as returned by `/users` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub object_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Login response: the user plus the session token
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "user-token")]
    pub user_token: String,
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Profile changes; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response() {
        let json = serde_json::json!({
            "objectId": "u1",
            "email": "jane@example.com",
            "name": "Jane",
            "user-token": "tok-123",
            "___class": "Users"
        });
        let login: LoginResponse = serde_json::from_value(json).unwrap();
        assert_eq!(login.user.object_id, "u1");
        assert_eq!(login.user_token, "tok-123");
        assert!(login.user.phone_number.is_none());
    }

    #[test]
    fn test_update_skips_unset() {
        let update = UserUpdate {
            name: Some("Jane".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Jane" }));
    }
}
