use mongodb::bson::{Document, doc};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::db::{self, DbConn};
use crate::models::{
    CATEGORIES, Category, CategoryResponse, LOCATIONS, Location, LocationQuery, LocationResponse,
};
use crate::utils::{ApiError, ItemList, contains_ignore_case, parse_optional_id};

const LOCATION_LIMIT: i64 = 200;

/// List categories
///
/// Only active categories unless `active` is anything other than `true`.
#[openapi(tag = "Catalog")]
#[get("/categories?<active>")]
pub async fn list_categories(
    db: &State<DbConn>,
    active: Option<String>,
) -> Result<Json<ItemList<CategoryResponse>>, ApiError> {
    let active_only = active.as_deref().map(str::trim).unwrap_or("true") == "true";
    let filter = if active_only {
        doc! { "isActive": true }
    } else {
        Document::new()
    };

    let categories = db::find_all(
        &db.collection::<Category>(CATEGORIES),
        filter,
        doc! { "name": 1 },
        None,
    )
    .await?;

    Ok(Json(ItemList::new(
        categories.into_iter().map(CategoryResponse::from).collect(),
    )))
}

/// List locations
#[openapi(tag = "Catalog")]
#[get("/locations?<query..>")]
pub async fn list_locations(
    db: &State<DbConn>,
    query: LocationQuery,
) -> Result<Json<ItemList<LocationResponse>>, ApiError> {
    let mut filter = Document::new();
    if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        filter.insert("name", contains_ignore_case(q));
    }
    if let Some(kind) = query.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        filter.insert("type", kind);
    }
    if let Some(parent_id) = parse_optional_id(query.parent_id.as_deref(), "parentId")? {
        filter.insert("parentId", parent_id);
    }

    let locations = db::find_all(
        &db.collection::<Location>(LOCATIONS),
        filter,
        doc! { "name": 1 },
        Some(LOCATION_LIMIT),
    )
    .await?;

    Ok(Json(ItemList::new(
        locations.into_iter().map(LocationResponse::from).collect(),
    )))
}
