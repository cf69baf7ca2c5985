//! User models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{SchoolId, UserId};

/// Declared account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
    #[serde(rename = "SCHOOLSTAFF")]
    SchoolStaff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Admin => "ADMIN",
            Self::SchoolStaff => "SCHOOLSTAFF",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "TEACHER" => Ok(Self::Teacher),
            "ADMIN" => Ok(Self::Admin),
            "SCHOOLSTAFF" => Ok(Self::SchoolStaff),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// A user account. The password hash is never selected into this struct.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub name: String,
    pub role: Option<String>,
    pub current_school_id: Option<SchoolId>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// The parsed role, `None` when unset or not a known role.
    pub fn declared_role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}

/// Columns selected for [`User`].
pub const USER_COLUMNS: &str = "id, email, username, name, role, current_school_id, gender, age, \
     address, phone, image, created_at, updated_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterUserDto {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Option<UserRole>,
    pub gender: Option<String>,
    #[validate(range(min = 1, max = 120, message = "age must be between 1 and 120"))]
    pub age: Option<i32>,
    pub address: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_round_trip_strings() {
        for role in [
            UserRole::Student,
            UserRole::Teacher,
            UserRole::Admin,
            UserRole::SchoolStaff,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::Value::String(role.as_str().to_string())
            );
        }
    }

    #[test]
    fn test_user_role_rejects_lowercase() {
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_register_dto_validation() {
        let dto = RegisterUserDto {
            email: "not-an-email".to_string(),
            username: "ab".to_string(),
            name: "Eric".to_string(),
            password: "short".to_string(),
            role: Some(UserRole::Teacher),
            gender: None,
            age: None,
            address: None,
            phone: None,
            image: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }
}
