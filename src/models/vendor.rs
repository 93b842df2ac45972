use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{AccountDto, CreatePackageDto, hex};
use crate::utils::iso;

pub const VENDORS: &str = "vendors";

string_enum! {
    /// Admin-controlled gate on whether a vendor may publish packages.
    pub enum VerificationStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        ResubmitRequired => "RESUBMIT_REQUIRED",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct Social {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub business_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_location_id: Option<ObjectId>,
    #[serde(default)]
    pub locations: Vec<ObjectId>,
    #[serde(default)]
    pub service_areas: Vec<String>,
    #[serde(default)]
    pub social: Social,
    pub verified_status: VerificationStatus,
    #[serde(default)]
    pub rating_avg: f64,
    #[serde(default)]
    pub rating_count: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Business section of a vendor sign-up.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDto {
    #[validate(length(min = 2))]
    pub business_name: String,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub primary_location_id: Option<String>,
    pub service_areas: Option<Vec<String>>,
    pub website: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterVendorDto {
    #[validate]
    pub account: AccountDto,
    #[validate]
    pub business: BusinessDto,
    pub packages: Option<Vec<CreatePackageDto>>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorDto {
    #[validate(length(min = 2))]
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub primary_location_id: Option<String>,
    pub locations: Option<Vec<String>>,
    pub service_areas: Option<Vec<String>>,
    pub social: Option<Social>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorListQuery {
    pub q: Option<String>,
    #[field(name = "categoryId")]
    pub category_id: Option<String>,
    #[field(name = "locationId")]
    pub location_id: Option<String>,
    #[field(name = "verifiedStatus")]
    pub verified_status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct VendorQueueQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct VerificationDto {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub business_name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub primary_location_id: Option<String>,
    pub locations: Vec<String>,
    pub service_areas: Vec<String>,
    pub social: Social,
    pub verified_status: VerificationStatus,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Vendor> for VendorResponse {
    fn from(vendor: Vendor) -> Self {
        VendorResponse {
            id: hex(vendor.id),
            user_id: vendor.user_id.to_hex(),
            business_name: vendor.business_name,
            description: vendor.description,
            category_id: vendor.category_id.map(|id| id.to_hex()),
            primary_location_id: vendor.primary_location_id.map(|id| id.to_hex()),
            locations: vendor.locations.iter().map(|id| id.to_hex()).collect(),
            service_areas: vendor.service_areas,
            social: vendor.social,
            verified_status: vendor.verified_status,
            rating_avg: vendor.rating_avg,
            rating_count: vendor.rating_count,
            created_at: iso(vendor.created_at),
            updated_at: iso(vendor.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorSummary {
    pub id: String,
    pub business_name: String,
    pub verified_status: VerificationStatus,
}

impl From<&Vendor> for VendorSummary {
    fn from(vendor: &Vendor) -> Self {
        VendorSummary {
            id: hex(vendor.id),
            business_name: vendor.business_name.clone(),
            verified_status: vendor.verified_status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VerificationResponse {
    pub vendor: VendorResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
