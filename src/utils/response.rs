use log::error;
use rocket::Request;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::Map;
use rocket_okapi::okapi::openapi3::{MediaType, RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::response::OpenApiResponderInner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Cursor;

use super::Pagination;
use crate::models::InvalidTransition;
use crate::services::PasswordError;

/// -----------------------------
/// Error body
/// -----------------------------
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// -----------------------------
/// API Error
/// -----------------------------
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: Status,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Status::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Status::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Status::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Status::InternalServerError, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 400 carrying the field errors reported by `validator`.
    pub fn validation(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        Self::bad_request("Validation failed").with_details(details)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        error!("database error: {}", err);
        ApiError::internal_error("Database error")
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        error!("password hashing failed: {}", err);
        ApiError::internal_error("Internal Server Error.")
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        error!("token signing failed: {}", err);
        ApiError::internal_error("Internal Server Error.")
    }
}

impl From<InvalidTransition> for ApiError {
    fn from(err: InvalidTransition) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.code, self.message)
    }
}

/// -----------------------------
/// Rocket Responder
/// -----------------------------
impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&self.body())
            .unwrap_or_else(|_| r#"{"error":"Internal Server Error."}"#.to_string());

        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

/// -----------------------------
/// OpenAPI integration
/// -----------------------------
impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let schema = generator.json_schema::<ErrorBody>();

        let mut content = Map::new();
        content.insert(
            "application/json".to_owned(),
            MediaType {
                schema: Some(schema),
                ..Default::default()
            },
        );

        let mut responses = Responses::default();

        for (code, description) in [
            ("400", "Bad request"),
            ("401", "Unauthorized"),
            ("403", "Forbidden"),
            ("404", "Not found"),
            ("500", "Internal server error"),
        ] {
            responses.responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    content: content.clone(),
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}

/// -----------------------------
/// Collection envelopes
/// -----------------------------
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: u64) -> Self {
        Page {
            items,
            page: pagination.page,
            limit: pagination.limit,
            total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ItemList<T> {
    pub items: Vec<T>,
}

impl<T> ItemList<T> {
    pub fn new(items: Vec<T>) -> Self {
        ItemList { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email)]
        email: String,
    }

    #[test]
    fn body_omits_missing_details() {
        let json = serde_json::to_value(ApiError::not_found("Vendor not found").body()).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Vendor not found" }));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let err: ApiError = Probe {
            email: "not-an-email".into(),
        }
        .validate()
        .unwrap_err()
        .into();

        assert_eq!(err.status, Status::BadRequest);
        assert_eq!(err.message, "Validation failed");
        let details = err.details.expect("details");
        assert!(details.get("email").is_some());
    }

    #[test]
    fn constructors_map_to_status_codes() {
        assert_eq!(ApiError::bad_request("x").status.code, 400);
        assert_eq!(ApiError::unauthorized("x").status.code, 401);
        assert_eq!(ApiError::forbidden("x").status.code, 403);
        assert_eq!(ApiError::not_found("x").status.code, 404);
        assert_eq!(ApiError::internal_error("x").status.code, 500);
    }
}
