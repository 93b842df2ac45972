use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::hex;
use crate::utils::iso;

pub const PACKAGES: &str = "packages";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub vendor_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ObjectId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Package {
    /// New packages start unpublished; publishing needs an approved vendor.
    pub fn draft(vendor_id: ObjectId, category_id: Option<ObjectId>, dto: CreatePackageDto) -> Self {
        let now = DateTime::now();
        Package {
            id: None,
            vendor_id,
            category_id,
            title: dto.title.trim().to_string(),
            description: dto.description,
            price_min: dto.price_min,
            price_max: dto.price_max,
            includes: dto.includes.unwrap_or_default(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }
}

fn check_price_range(min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), _) if min < 0.0 => Err(ValidationError::new("price_negative")),
        (_, Some(max)) if max < 0.0 => Err(ValidationError::new("price_negative")),
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("price_range")),
        _ => Ok(()),
    }
}

fn create_price_range(dto: &CreatePackageDto) -> Result<(), ValidationError> {
    check_price_range(dto.price_min, dto.price_max)
}

fn update_price_range(dto: &UpdatePackageDto) -> Result<(), ValidationError> {
    check_price_range(dto.price_min, dto.price_max)
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "create_price_range", skip_on_field_errors = false))]
pub struct CreatePackageDto {
    pub category_id: Option<String>,
    #[validate(length(min = 2))]
    pub title: String,
    pub description: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub includes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "update_price_range", skip_on_field_errors = false))]
pub struct UpdatePackageDto {
    pub category_id: Option<String>,
    #[validate(length(min = 2))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub includes: Option<Vec<String>>,
}

impl UpdatePackageDto {
    pub fn touches_price(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    /// Checks the price range the stored package would have after this patch.
    pub fn check_merged_price(&self, current: &Package) -> Result<(), ValidationErrors> {
        let min = self.price_min.or(current.price_min);
        let max = self.price_max.or(current.price_max);

        check_price_range(min, max).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add("__all__", e);
            errors
        })
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub vendor_id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub includes: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Package> for PackageResponse {
    fn from(package: Package) -> Self {
        PackageResponse {
            id: hex(package.id),
            vendor_id: package.vendor_id.to_hex(),
            category_id: package.category_id.map(|id| id.to_hex()),
            title: package.title,
            description: package.description,
            price_min: package.price_min,
            price_max: package.price_max,
            includes: package.includes,
            is_active: package.is_active,
            created_at: iso(package.created_at),
            updated_at: iso(package.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(min: Option<f64>, max: Option<f64>) -> CreatePackageDto {
        CreatePackageDto {
            category_id: None,
            title: "Full day coverage".into(),
            description: None,
            price_min: min,
            price_max: max,
            includes: None,
        }
    }

    #[test]
    fn price_range_must_be_ordered() {
        assert!(dto(Some(5000.0), Some(20000.0)).validate().is_ok());
        assert!(dto(Some(5000.0), None).validate().is_ok());
        assert!(dto(Some(20000.0), Some(5000.0)).validate().is_err());
        assert!(dto(Some(-1.0), None).validate().is_err());
    }

    #[test]
    fn short_title_is_rejected() {
        let mut pkg = dto(None, None);
        pkg.title = "x".into();
        let errors = pkg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn patch_is_checked_against_stored_prices() {
        let stored = Package::draft(ObjectId::new(), None, dto(None, Some(1000.0)));
        let patch: UpdatePackageDto =
            serde_json::from_value(serde_json::json!({ "priceMin": 50000.0 })).unwrap();

        assert!(patch.validate().is_ok());
        assert!(patch.touches_price());
        let errors = patch.check_merged_price(&stored).unwrap_err();
        assert!(errors.errors().contains_key("__all__"));

        let both: UpdatePackageDto = serde_json::from_value(
            serde_json::json!({ "priceMin": 50000.0, "priceMax": 90000.0 }),
        )
        .unwrap();
        assert!(both.check_merged_price(&stored).is_ok());

        let title_only: UpdatePackageDto =
            serde_json::from_value(serde_json::json!({ "title": "Half day" })).unwrap();
        assert!(!title_only.touches_price());
    }

    #[test]
    fn drafts_are_inactive() {
        let package = Package::draft(ObjectId::new(), None, dto(Some(1.0), Some(2.0)));
        assert!(!package.is_active);
        assert!(package.includes.is_empty());
    }
}
