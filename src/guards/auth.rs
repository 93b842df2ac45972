use log::debug;
use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use super::reject;
use crate::config::Config;
use crate::models::Role;
use crate::services::JwtService;
use crate::utils::ApiError;

/// Caller identity taken from a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub role: Role,
}

impl AuthUser {
    fn authenticate(req: &Request<'_>) -> Result<AuthUser, ApiError> {
        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Missing token"))?;

        let config = req
            .rocket()
            .state::<Config>()
            .ok_or_else(|| ApiError::internal_error("Configuration not loaded"))?;

        let claims = JwtService::verify_token(config, token.trim()).map_err(|e| {
            debug!("rejected bearer token: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;

        let user_id = ObjectId::parse_str(&claims.sub)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }

    fn require(req: &Request<'_>, role: Role) -> Result<AuthUser, ApiError> {
        let auth = Self::authenticate(req)?;
        if auth.role != role {
            return Err(ApiError::forbidden("Insufficient role"));
        }
        Ok(auth)
    }
}

fn outcome<T>(req: &Request<'_>, result: Result<T, ApiError>) -> request::Outcome<T, ()> {
    match result {
        Ok(value) => Outcome::Success(value),
        Err(err) => {
            let status: Status = err.status;
            reject(req, err);
            Outcome::Error((status, ()))
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        outcome(req, AuthUser::authenticate(req))
    }
}

/// Role-restricted guards; each derefs to the underlying [`AuthUser`].
macro_rules! role_guard {
    ($name:ident, $role:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub AuthUser);

        impl std::ops::Deref for $name {
            type Target = AuthUser;

            fn deref(&self) -> &AuthUser {
                &self.0
            }
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                outcome(req, AuthUser::require(req, $role).map($name))
            }
        }

        impl<'a> OpenApiFromRequest<'a> for $name {
            fn from_request_input(
                generator: &mut OpenApiGenerator,
                name: String,
                required: bool,
            ) -> rocket_okapi::Result<RequestHeaderInput> {
                AuthUser::from_request_input(generator, name, required)
            }
        }
    };
}

role_guard!(CustomerAuth, Role::Customer);
role_guard!(VendorAuth, Role::Vendor);
role_guard!(AdminAuth, Role::Admin);

/// === OpenAPI Integration ===
/// Documents the bearer scheme so Swagger UI offers an "Authorize" button.
impl<'a> OpenApiFromRequest<'a> for AuthUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let scheme = SecurityScheme {
            description: Some("JWT issued by POST /api/auth/login".to_owned()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_owned(),
                bearer_format: Some("JWT".to_owned()),
            },
            extensions: Object::default(),
        };

        let mut requirement = SecurityRequirement::new();
        requirement.insert("bearerAuth".to_owned(), Vec::new());

        Ok(RequestHeaderInput::Security(
            "bearerAuth".to_owned(),
            scheme,
            requirement,
        ))
    }
}
