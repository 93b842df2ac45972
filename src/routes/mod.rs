pub mod admin;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod event;
pub mod package;
pub mod vendor;
pub mod vendor_booking;

use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::db::DbConn;
use crate::models::{VENDORS, Vendor};
use crate::utils::ApiError;

/// The vendor profile owned by `user_id`.
pub(crate) async fn vendor_for(db: &DbConn, user_id: ObjectId) -> Result<Vendor, ApiError> {
    db.collection::<Vendor>(VENDORS)
        .find_one(doc! { "userId": user_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor profile not found"))
}

/// `find_one_and_update` returning the document as written.
pub(crate) fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}
