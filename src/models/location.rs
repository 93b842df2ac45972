use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

use super::hex;

pub const LOCATIONS: &str = "locations";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub struct Geo {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A city or area; areas point at their city through `parent_id`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub q: Option<String>,
    #[field(name = "type")]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[field(name = "parentId")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent_id: Option<String>,
    pub geo: Option<Geo>,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        LocationResponse {
            id: hex(location.id),
            name: location.name,
            slug: location.slug,
            kind: location.kind,
            parent_id: location.parent_id.map(|id| id.to_hex()),
            geo: location.geo,
        }
    }
}
