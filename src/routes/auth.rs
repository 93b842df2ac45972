use log::{info, warn};
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::options::FindOneOptions;
use rocket::State;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use validator::Validate;

use crate::config::Config;
use crate::db::{DbConn, is_duplicate_key};
use crate::guards::{AuthUser, ValidJson};
use crate::models::{
    AccountDto, AuthResponse, LoginDto, PACKAGES, Package, RegisterVendorDto, Role, Social, USERS,
    User, UserResponse, UserStatus, VENDORS, Vendor, VendorRegistrationResponse, VendorSummary,
    VerificationStatus,
};
use crate::services::{JwtService, PasswordService};
use crate::utils::{ApiError, parse_optional_id};

async fn ensure_email_free(db: &DbConn, email: &str) -> Result<(), ApiError> {
    let existing = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": email }, None)
        .await?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Email already exists"));
    }
    Ok(())
}

/// Inserts the account and returns it with its new id.
async fn create_user(db: &DbConn, account: &AccountDto, role: Role) -> Result<User, ApiError> {
    let email = account.email.trim().to_lowercase();
    ensure_email_free(db, &email).await?;

    let password_hash = PasswordService::hash(&account.password).await?;
    let mut user = User::new(account, password_hash, role);

    let result = db
        .collection::<User>(USERS)
        .insert_one(&user, None)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                ApiError::bad_request("Email already exists")
            } else {
                e.into()
            }
        })?;

    user.id = result.inserted_id.as_object_id();
    Ok(user)
}

/// Best-effort removal of everything a failed vendor registration wrote.
pub async fn rollback_vendor_registration(db: &DbConn, user_id: ObjectId) {
    let vendors = db.collection::<Document>(VENDORS);
    let only_id = FindOneOptions::builder().projection(doc! { "_id": 1 }).build();

    match vendors.find_one(doc! { "userId": user_id }, only_id).await {
        Ok(Some(vendor)) => {
            if let Ok(vendor_id) = vendor.get_object_id("_id") {
                if let Err(e) = db
                    .collection::<Document>(PACKAGES)
                    .delete_many(doc! { "vendorId": vendor_id }, None)
                    .await
                {
                    warn!("could not remove packages of vendor {}: {}", vendor_id, e);
                }
            }
        }
        Ok(None) => {}
        Err(e) => warn!("could not look up vendor of user {}: {}", user_id, e),
    }
    if let Err(e) = vendors.delete_one(doc! { "userId": user_id }, None).await {
        warn!("could not remove vendor of user {}: {}", user_id, e);
    }
    if let Err(e) = db
        .collection::<Document>(USERS)
        .delete_one(doc! { "_id": user_id }, None)
        .await
    {
        warn!("could not remove user {}: {}", user_id, e);
    }
}

/// --------------------
/// Register customer
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register/customer", data = "<dto>")]
pub async fn register_customer(
    db: &State<DbConn>,
    dto: ValidJson<AccountDto>,
) -> Result<Created<Json<UserResponse>>, ApiError> {
    let user = create_user(db, &dto, Role::Customer).await?;
    info!("registered customer {}", user.email);

    Ok(Created::new("/api/auth/me").body(Json(user.into())))
}

/// --------------------
/// Register vendor
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register/vendor", data = "<dto>")]
pub async fn register_vendor(
    db: &State<DbConn>,
    dto: ValidJson<RegisterVendorDto>,
) -> Result<Created<Json<VendorRegistrationResponse>>, ApiError> {
    let RegisterVendorDto {
        account,
        business,
        packages,
    } = dto.into_inner();

    let packages = packages.unwrap_or_default();
    for package in &packages {
        package.validate()?;
    }

    let category_id = parse_optional_id(business.category_id.as_deref(), "categoryId")?;
    let primary_location_id =
        parse_optional_id(business.primary_location_id.as_deref(), "primaryLocationId")?;

    let user = create_user(db, &account, Role::Vendor).await?;
    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("Failed to create user"))?;

    let now = DateTime::now();
    let mut vendor = Vendor {
        id: None,
        user_id,
        business_name: business.business_name.trim().to_string(),
        description: business.description,
        category_id,
        primary_location_id,
        locations: primary_location_id.into_iter().collect(),
        service_areas: business.service_areas.unwrap_or_default(),
        social: Social {
            website: business.website,
            instagram: business.instagram,
            facebook: business.facebook,
        },
        verified_status: VerificationStatus::Pending,
        rating_avg: 0.0,
        rating_count: 0,
        created_at: now,
        updated_at: now,
    };

    let created = async {
        let result = db
            .collection::<Vendor>(VENDORS)
            .insert_one(&vendor, None)
            .await?;
        let vendor_id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::internal_error("Failed to create vendor"))?;

        if !packages.is_empty() {
            let drafts: Vec<Package> = packages
                .into_iter()
                .map(|p| Package::draft(vendor_id, category_id, p))
                .collect();
            db.collection::<Package>(PACKAGES)
                .insert_many(drafts, None)
                .await?;
        }
        Ok::<ObjectId, ApiError>(vendor_id)
    }
    .await;

    match created {
        Ok(vendor_id) => vendor.id = Some(vendor_id),
        Err(err) => {
            warn!("vendor registration for {} failed, removing account", user.email);
            rollback_vendor_registration(db, user_id).await;
            return Err(err);
        }
    }

    info!("registered vendor {} ({})", vendor.business_name, user.email);

    Ok(Created::new("/api/vendors/me").body(Json(VendorRegistrationResponse {
        vendor: VendorSummary::from(&vendor),
        user: user.into(),
    })))
}

/// --------------------
/// Login
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    config: &State<Config>,
    dto: ValidJson<LoginDto>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = dto.email.trim().to_lowercase();

    let mut user = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": &email }, None)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !PasswordService::verify(&dto.password, &user.password_hash).await? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if user.status == UserStatus::Suspended {
        return Err(ApiError::forbidden("Account suspended"));
    }

    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal_error("User without id"))?;

    let now = DateTime::now();
    db.collection::<User>(USERS)
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "lastLoginAt": now, "updatedAt": now } },
            None,
        )
        .await?;
    user.last_login_at = Some(now);

    let token = JwtService::generate_access_token(config, &user_id, user.role)?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// --------------------
/// Current user
/// --------------------
#[openapi(tag = "Auth")]
#[get("/auth/me")]
pub async fn me(db: &State<DbConn>, auth: AuthUser) -> Result<Json<UserResponse>, ApiError> {
    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "_id": auth.user_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}
