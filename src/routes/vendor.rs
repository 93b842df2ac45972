use mongodb::bson::{self, DateTime, Document, doc};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::{return_updated, vendor_for};
use crate::db::{self, DbConn};
use crate::guards::{ValidJson, VendorAuth};
use crate::models::{
    UpdateVendorDto, VENDORS, Vendor, VendorListQuery, VendorResponse, VerificationStatus,
};
use crate::utils::{
    ApiError, Page, Pagination, contains_ignore_case, parse_filter, parse_id_or_not_found,
    parse_ids, parse_optional_id,
};

/// Get my vendor profile
#[openapi(tag = "Vendors")]
#[get("/vendors/me")]
pub async fn get_my_vendor(
    db: &State<DbConn>,
    auth: VendorAuth,
) -> Result<Json<VendorResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    Ok(Json(vendor.into()))
}

/// Update my vendor profile
#[openapi(tag = "Vendors")]
#[patch("/vendors/me", data = "<dto>")]
pub async fn update_my_vendor(
    db: &State<DbConn>,
    auth: VendorAuth,
    dto: ValidJson<UpdateVendorDto>,
) -> Result<Json<VendorResponse>, ApiError> {
    let dto = dto.into_inner();
    let mut updates = Document::new();

    if let Some(name) = dto.business_name {
        updates.insert("businessName", name.trim());
    }
    if let Some(description) = dto.description {
        updates.insert("description", description);
    }
    if let Some(category_id) = parse_optional_id(dto.category_id.as_deref(), "categoryId")? {
        updates.insert("categoryId", category_id);
    }
    if let Some(location_id) =
        parse_optional_id(dto.primary_location_id.as_deref(), "primaryLocationId")?
    {
        updates.insert("primaryLocationId", location_id);
    }
    if let Some(locations) = dto.locations {
        updates.insert("locations", parse_ids(&locations, "locations")?);
    }
    if let Some(areas) = dto.service_areas {
        updates.insert("serviceAreas", areas);
    }
    if let Some(social) = dto.social {
        let social = bson::to_bson(&social)
            .map_err(|_| ApiError::bad_request("Invalid social links"))?;
        updates.insert("social", social);
    }
    updates.insert("updatedAt", DateTime::now());

    let vendor = db
        .collection::<Vendor>(VENDORS)
        .find_one_and_update(
            doc! { "userId": auth.user_id },
            doc! { "$set": updates },
            return_updated(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor profile not found"))?;

    Ok(Json(vendor.into()))
}

/// List vendors (public)
#[openapi(tag = "Marketplace")]
#[get("/vendors?<query..>")]
pub async fn list_vendors(
    db: &State<DbConn>,
    query: VendorListQuery,
) -> Result<Json<Page<VendorResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;

    let mut filter = Document::new();
    let status: Option<VerificationStatus> =
        parse_filter(query.verified_status.as_deref(), "Invalid verifiedStatus")?;
    if let Some(status) = status {
        filter.insert("verifiedStatus", status);
    }
    if let Some(category_id) = parse_optional_id(query.category_id.as_deref(), "categoryId")? {
        filter.insert("categoryId", category_id);
    }
    if let Some(location_id) = parse_optional_id(query.location_id.as_deref(), "locationId")? {
        filter.insert("locations", location_id);
    }
    if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        filter.insert("businessName", contains_ignore_case(q));
    }

    let (vendors, total) = db::find_page(
        &db.collection::<Vendor>(VENDORS),
        filter,
        doc! { "createdAt": -1 },
        pagination,
    )
    .await?;

    let items = vendors.into_iter().map(VendorResponse::from).collect();
    Ok(Json(Page::new(items, pagination, total)))
}

/// Get vendor public profile
#[openapi(tag = "Marketplace")]
#[get("/vendors/<id>")]
pub async fn get_vendor(db: &State<DbConn>, id: String) -> Result<Json<VendorResponse>, ApiError> {
    let vendor_id = parse_id_or_not_found(&id, "Vendor not found")?;

    let vendor = db
        .collection::<Vendor>(VENDORS)
        .find_one(doc! { "_id": vendor_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

    Ok(Json(vendor.into()))
}
