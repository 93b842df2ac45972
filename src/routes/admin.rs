use log::{info, warn};
use mongodb::bson::{DateTime, Document, doc};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::return_updated;
use crate::db::{self, DbConn};
use crate::guards::{AdminAuth, ValidJson};
use crate::models::{
    AUDIT_LOGS, AuditLog, PACKAGES, Package, Role, USERS, UpdateUserStatusDto, User,
    UserListQuery, UserResponse, UserStatus, VENDORS, Vendor, VendorQueueQuery, VendorResponse,
    VerificationDto, VerificationResponse, VerificationStatus,
};
use crate::utils::{ApiError, Page, Pagination, parse_filter, parse_id_or_not_found};

async fn audit(db: &DbConn, entry: AuditLog) {
    if let Err(e) = db
        .collection::<AuditLog>(AUDIT_LOGS)
        .insert_one(&entry, None)
        .await
    {
        warn!("failed to write audit log for {}: {}", entry.action, e);
    }
}

/// ============================
/// VENDOR VERIFICATION
/// ============================

/// Set a vendor's verification status
///
/// Anything other than APPROVED also takes the vendor's packages off the
/// marketplace.
#[openapi(tag = "Admin")]
#[patch("/admin/vendors/<id>/verification", data = "<dto>")]
pub async fn verify_vendor(
    db: &State<DbConn>,
    auth: AdminAuth,
    id: String,
    dto: ValidJson<VerificationDto>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let vendor_id = parse_id_or_not_found(&id, "Vendor not found")?;
    let dto = dto.into_inner();

    let status: VerificationStatus = dto
        .status
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid verification status"))?;
    let note = dto
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let now = DateTime::now();
    let before = db
        .collection::<Vendor>(VENDORS)
        .find_one_and_update(
            doc! { "_id": vendor_id },
            doc! { "$set": { "verifiedStatus": status, "updatedAt": now } },
            FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::Before)
                .build(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

    let previous = before.verified_status;
    let mut vendor = before;
    vendor.verified_status = status;
    vendor.updated_at = now;

    if status != VerificationStatus::Approved {
        let result = db
            .collection::<Package>(PACKAGES)
            .update_many(
                doc! { "vendorId": vendor_id, "isActive": true },
                doc! { "$set": { "isActive": false, "updatedAt": now } },
                None,
            )
            .await?;
        if result.modified_count > 0 {
            info!(
                "unpublished {} package(s) of vendor {}",
                result.modified_count, vendor_id
            );
        }
    }

    audit(
        db,
        AuditLog::new(
            auth.user_id,
            "VENDOR_VERIFICATION",
            "Vendor",
            vendor_id,
            doc! {
                "verifiedStatus": { "from": previous, "to": status },
                "note": note.clone(),
            },
        ),
    )
    .await;

    info!("vendor {} verification {} -> {}", vendor_id, previous, status);

    Ok(Json(VerificationResponse {
        vendor: vendor.into(),
        note,
    }))
}

/// Vendor verification queue
#[openapi(tag = "Admin")]
#[get("/admin/vendors?<query..>")]
pub async fn list_vendor_queue(
    db: &State<DbConn>,
    _auth: AdminAuth,
    query: VendorQueueQuery,
) -> Result<Json<Page<VendorResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;

    let mut filter = Document::new();
    if let Some(status) = parse_filter::<VerificationStatus>(
        query.status.as_deref(),
        "Invalid verification status",
    )? {
        filter.insert("verifiedStatus", status);
    }

    let (vendors, total) = db::find_page(
        &db.collection::<Vendor>(VENDORS),
        filter,
        doc! { "createdAt": 1 },
        pagination,
    )
    .await?;

    let items = vendors.into_iter().map(VendorResponse::from).collect();
    Ok(Json(Page::new(items, pagination, total)))
}

/// ============================
/// USERS
/// ============================

/// List users
#[openapi(tag = "Admin")]
#[get("/admin/users?<query..>")]
pub async fn list_users(
    db: &State<DbConn>,
    _auth: AdminAuth,
    query: UserListQuery,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;

    let mut filter = Document::new();
    if let Some(role) = parse_filter::<Role>(query.role.as_deref(), "Invalid role")? {
        filter.insert("role", role);
    }
    if let Some(status) = parse_filter::<UserStatus>(query.status.as_deref(), "Invalid status")? {
        filter.insert("status", status);
    }

    let (users, total) = db::find_page(
        &db.collection::<User>(USERS),
        filter,
        doc! { "createdAt": -1 },
        pagination,
    )
    .await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(Page::new(items, pagination, total)))
}

/// Suspend or reactivate a user
#[openapi(tag = "Admin")]
#[patch("/admin/users/<id>/status", data = "<dto>")]
pub async fn update_user_status(
    db: &State<DbConn>,
    auth: AdminAuth,
    id: String,
    dto: ValidJson<UpdateUserStatusDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = parse_id_or_not_found(&id, "User not found")?;

    let status: UserStatus = dto
        .status
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status"))?;

    if user_id == auth.user_id {
        return Err(ApiError::bad_request("You cannot change your own status"));
    }

    let user = db
        .collection::<User>(USERS)
        .find_one_and_update(
            doc! { "_id": user_id },
            doc! { "$set": { "status": status, "updatedAt": DateTime::now() } },
            return_updated(),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    audit(
        db,
        AuditLog::new(
            auth.user_id,
            "USER_STATUS",
            "User",
            user_id,
            doc! { "status": status },
        ),
    )
    .await;

    info!("user {} status set to {}", user.email, status);

    Ok(Json(user.into()))
}
