#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod guards;
pub mod migrations;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use log::{error, info};
use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{Header, Status};
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::config::Config;
use crate::utils::ApiError;

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
            response.set_header(Header::new("Vary", "Origin"));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PATCH, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- HEALTH ----------------------------- */

#[get("/health")]
fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/* ----------------------------- ERRORS ----------------------------- */

/// Guard failures leave their own error behind; everything else gets `fallback`.
fn caught(req: &Request<'_>, fallback: ApiError) -> ApiError {
    guards::failure(req).unwrap_or(fallback)
}

#[catch(400)]
fn bad_request(req: &Request) -> ApiError {
    caught(req, ApiError::bad_request("Bad request"))
}

#[catch(401)]
fn unauthorized(req: &Request) -> ApiError {
    caught(req, ApiError::unauthorized("Unauthorized"))
}

#[catch(403)]
fn forbidden(req: &Request) -> ApiError {
    caught(req, ApiError::forbidden("Forbidden"))
}

#[catch(404)]
fn not_found(req: &Request) -> ApiError {
    caught(req, ApiError::not_found("Route not found"))
}

#[catch(422)]
fn unprocessable(req: &Request) -> ApiError {
    caught(
        req,
        ApiError::new(Status::UnprocessableEntity, "Unprocessable request"),
    )
}

#[catch(500)]
fn internal_error(req: &Request) -> ApiError {
    caught(req, ApiError::internal_error("Internal Server Error."))
}

#[catch(default)]
fn default_catcher(status: Status, req: &Request) -> ApiError {
    let reason = status.reason().unwrap_or("Unexpected error");
    caught(req, ApiError::new(status, reason))
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- BUILD ----------------------------- */

/// Loads and validates [`Config`] from the launch figment, aborting ignition on error.
fn config_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Config", |rocket| async {
        match Config::from_figment(rocket.figment()) {
            Ok(config) => {
                info!("✓ Configuration loaded (database {})", config.mongo_db);
                Ok(rocket.manage(config))
            }
            Err(e) => {
                error!("✗ {}", e);
                Err(rocket)
            }
        }
    })
}

/// The whole HTTP surface without a database; `main` attaches [`db::init`].
pub fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(config_fairing())
        .attach(CORS)
        .mount("/", routes![options_handler, health])
        .mount(
            "/api",
            openapi_get_routes![
                // Auth
                routes::auth::register_customer,
                routes::auth::register_vendor,
                routes::auth::login,
                routes::auth::me,
                // Vendors
                routes::vendor::get_my_vendor,
                routes::vendor::update_my_vendor,
                routes::vendor::list_vendors,
                routes::vendor::get_vendor,
                // Packages
                routes::package::list_my_packages,
                routes::package::create_package,
                routes::package::update_package,
                routes::package::delete_package,
                routes::package::publish_package,
                routes::package::unpublish_package,
                routes::package::list_vendor_packages,
                // Events
                routes::event::create_event,
                routes::event::list_events,
                routes::event::get_event,
                routes::event::update_event,
                // Bookings
                routes::booking::create_booking,
                routes::booking::list_bookings,
                routes::booking::get_booking,
                routes::booking::cancel_booking,
                routes::booking::confirm_booking,
                // Vendor bookings
                routes::vendor_booking::list_vendor_bookings,
                routes::vendor_booking::get_vendor_booking,
                routes::vendor_booking::decide_booking,
                routes::vendor_booking::complete_booking,
                // Catalog
                routes::catalog::list_categories,
                routes::catalog::list_locations,
                // Admin
                routes::admin::verify_vendor,
                routes::admin::list_vendor_queue,
                routes::admin::list_users,
                routes::admin::update_user_status,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error,
                default_catcher
            ],
        )
}
