use log::info;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use rocket::State;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::{return_updated, vendor_for};
use crate::db::{self, DbConn};
use crate::guards::{ValidJson, VendorAuth};
use crate::models::{
    CreatePackageDto, DeleteResponse, PACKAGES, Package, PackageResponse, UpdatePackageDto,
    VerificationStatus,
};
use crate::utils::{ApiError, ItemList, parse_id_or_not_found, parse_optional_id};

async fn set_active(
    db: &DbConn,
    vendor_id: ObjectId,
    package_id: ObjectId,
    active: bool,
) -> Result<Package, ApiError> {
    db.collection::<Package>(PACKAGES)
        .find_one_and_update(
            doc! { "_id": package_id, "vendorId": vendor_id },
            doc! { "$set": { "isActive": active, "updatedAt": DateTime::now() } },
            return_updated(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Package not found"))
}

/// List my packages
#[openapi(tag = "Packages")]
#[get("/vendors/me/packages")]
pub async fn list_my_packages(
    db: &State<DbConn>,
    auth: VendorAuth,
) -> Result<Json<ItemList<PackageResponse>>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;

    let packages = db::find_all(
        &db.collection::<Package>(PACKAGES),
        doc! { "vendorId": vendor.id },
        doc! { "createdAt": -1 },
        None,
    )
    .await?;

    Ok(Json(ItemList::new(
        packages.into_iter().map(PackageResponse::from).collect(),
    )))
}

/// Create a package (starts unpublished)
#[openapi(tag = "Packages")]
#[post("/vendors/me/packages", data = "<dto>")]
pub async fn create_package(
    db: &State<DbConn>,
    auth: VendorAuth,
    dto: ValidJson<CreatePackageDto>,
) -> Result<Created<Json<PackageResponse>>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| ApiError::internal_error("Vendor without id"))?;

    let dto = dto.into_inner();
    let category_id = parse_optional_id(dto.category_id.as_deref(), "categoryId")?;
    let mut package = Package::draft(vendor_id, category_id, dto);

    let result = db
        .collection::<Package>(PACKAGES)
        .insert_one(&package, None)
        .await?;
    package.id = result.inserted_id.as_object_id();

    info!("vendor {} created package {}", vendor_id, package.title);

    let location = format!("/api/vendors/{}/packages", vendor_id.to_hex());
    Ok(Created::new(location).body(Json(package.into())))
}

/// Update my package
#[openapi(tag = "Packages")]
#[patch("/vendors/me/packages/<id>", data = "<dto>")]
pub async fn update_package(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
    dto: ValidJson<UpdatePackageDto>,
) -> Result<Json<PackageResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let package_id = parse_id_or_not_found(&id, "Package not found")?;
    let dto = dto.into_inner();
    let packages = db.collection::<Package>(PACKAGES);
    let scope = doc! { "_id": package_id, "vendorId": vendor.id };

    if dto.touches_price() {
        let current = packages
            .find_one(scope.clone(), None)
            .await?
            .ok_or_else(|| ApiError::not_found("Package not found"))?;
        dto.check_merged_price(&current)?;
    }

    let mut updates = Document::new();
    if let Some(category_id) = parse_optional_id(dto.category_id.as_deref(), "categoryId")? {
        updates.insert("categoryId", category_id);
    }
    if let Some(title) = dto.title {
        updates.insert("title", title.trim());
    }
    if let Some(description) = dto.description {
        updates.insert("description", description);
    }
    if let Some(price_min) = dto.price_min {
        updates.insert("priceMin", price_min);
    }
    if let Some(price_max) = dto.price_max {
        updates.insert("priceMax", price_max);
    }
    if let Some(includes) = dto.includes {
        updates.insert("includes", includes);
    }
    updates.insert("updatedAt", DateTime::now());

    let package = packages
        .find_one_and_update(scope, doc! { "$set": updates }, return_updated())
        .await?
        .ok_or_else(|| ApiError::not_found("Package not found"))?;

    Ok(Json(package.into()))
}

/// Delete my package
#[openapi(tag = "Packages")]
#[delete("/vendors/me/packages/<id>")]
pub async fn delete_package(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
) -> Result<Json<DeleteResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let package_id = parse_id_or_not_found(&id, "Package not found")?;

    let result = db
        .collection::<Package>(PACKAGES)
        .delete_one(doc! { "_id": package_id, "vendorId": vendor.id }, None)
        .await?;

    Ok(Json(DeleteResponse {
        deleted: result.deleted_count == 1,
    }))
}

/// Publish my package (vendor must be APPROVED)
#[openapi(tag = "Packages")]
#[post("/vendors/me/packages/<id>/publish")]
pub async fn publish_package(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
) -> Result<Json<PackageResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;

    if vendor.verified_status != VerificationStatus::Approved {
        return Err(ApiError::bad_request(
            "Vendor must be verified before publishing packages",
        ));
    }

    let vendor_id = vendor
        .id
        .ok_or_else(|| ApiError::internal_error("Vendor without id"))?;
    let package_id = parse_id_or_not_found(&id, "Package not found")?;

    let package = set_active(db, vendor_id, package_id, true).await?;
    Ok(Json(package.into()))
}

/// Unpublish my package
#[openapi(tag = "Packages")]
#[post("/vendors/me/packages/<id>/unpublish")]
pub async fn unpublish_package(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
) -> Result<Json<PackageResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| ApiError::internal_error("Vendor without id"))?;
    let package_id = parse_id_or_not_found(&id, "Package not found")?;

    let package = set_active(db, vendor_id, package_id, false).await?;
    Ok(Json(package.into()))
}

/// List active packages for a vendor (public)
#[openapi(tag = "Marketplace")]
#[get("/vendors/<vendor_id>/packages")]
pub async fn list_vendor_packages(
    db: &State<DbConn>,
    vendor_id: String,
) -> Result<Json<ItemList<PackageResponse>>, ApiError> {
    let vendor_id = parse_id_or_not_found(&vendor_id, "Vendor not found")?;

    let packages = db::find_all(
        &db.collection::<Package>(PACKAGES),
        doc! { "vendorId": vendor_id, "isActive": true },
        doc! { "createdAt": -1 },
        None,
    )
    .await?;

    Ok(Json(ItemList::new(
        packages.into_iter().map(PackageResponse::from).collect(),
    )))
}
