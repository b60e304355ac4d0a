use serde::{Deserialize, Serialize};

use crate::users::repo::User;

/// Request body for creating a user through the plain CRUD surface.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Request body for updating a user. The password, if any, is not
/// reachable through this surface.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let req: CreateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.username.is_empty());
        assert!(req.email.is_empty());
    }

    #[test]
    fn public_user_drops_the_hash() {
        let user = User {
            id: 7,
            username: "bob".into(),
            email: "b@x.com".into(),
            password_hash: Some("hash".into()),
        };
        let public = PublicUser::from(user);
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, r#"{"id":7,"username":"bob","email":"b@x.com"}"#);
    }
}
