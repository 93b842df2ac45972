use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{VendorSummary, hex};
use crate::utils::iso;

pub const USERS: &str = "users";

string_enum! {
    pub enum Role {
        Customer => "CUSTOMER",
        Vendor => "VENDOR",
        Admin => "ADMIN",
    }
}

string_enum! {
    pub enum UserStatus {
        Active => "ACTIVE",
        Suspended => "SUSPENDED",
        Pending => "PENDING",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub fn new(account: &AccountDto, password_hash: String, role: Role) -> Self {
        let now = DateTime::now();
        User {
            id: None,
            full_name: account.full_name.trim().to_string(),
            email: account.email.trim().to_lowercase(),
            phone: account.phone.clone(),
            password_hash,
            role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Account fields shared by customer and vendor registration.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    #[validate(length(min = 2))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 6))]
    pub password: String,
    pub accept_terms: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct LoginDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct UpdateUserStatusDto {
    pub status: String,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: UserStatus,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: hex(user.id),
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            status: user.status,
            last_login_at: user.last_login_at.map(iso),
            created_at: iso(user.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VendorRegistrationResponse {
    pub user: UserResponse,
    pub vendor: VendorSummary,
}
