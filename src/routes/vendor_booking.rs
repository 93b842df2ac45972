use mongodb::bson::{Document, doc};
use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::booking::{advance_booking, status_filter};
use super::vendor_for;
use crate::db::{self, DbConn};
use crate::guards::{ValidJson, VendorAuth};
use crate::models::{
    BOOKINGS, Booking, BookingAction, BookingListQuery, BookingResponse, Decision,
    VendorDecisionDto,
};
use crate::utils::{ApiError, Page, Pagination, parse_id_or_not_found};

const DEFAULT_REJECT_REASON: &str = "Rejected by vendor";

/// List bookings addressed to me
#[openapi(tag = "Vendor Bookings")]
#[get("/vendors/me/bookings?<query..>")]
pub async fn list_vendor_bookings(
    db: &State<DbConn>,
    auth: VendorAuth,
    query: BookingListQuery,
) -> Result<Json<Page<BookingResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;
    let vendor = vendor_for(db, auth.user_id).await?;

    let mut filter = doc! { "vendorId": vendor.id };
    if let Some(status) = status_filter(query.status.as_deref())? {
        filter.insert("status", status);
    }

    let (bookings, total) = db::find_page(
        &db.collection::<Booking>(BOOKINGS),
        filter,
        doc! { "createdAt": -1 },
        pagination,
    )
    .await?;

    let items = bookings.into_iter().map(BookingResponse::from).collect();
    Ok(Json(Page::new(items, pagination, total)))
}

/// Get a booking addressed to me
#[openapi(tag = "Vendor Bookings")]
#[get("/vendors/me/bookings/<id>")]
pub async fn get_vendor_booking(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
) -> Result<Json<BookingResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;

    let booking = db
        .collection::<Booking>(BOOKINGS)
        .find_one(doc! { "_id": booking_id, "vendorId": vendor.id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(booking.into()))
}

/// Accept or reject a requested booking
#[openapi(tag = "Vendor Bookings")]
#[patch("/vendors/me/bookings/<id>/decision", data = "<dto>")]
pub async fn decide_booking(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
    dto: ValidJson<VendorDecisionDto>,
) -> Result<Json<BookingResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;
    let dto = dto.into_inner();

    let mut set = Document::new();
    if let Some(note) = dto.vendor_note {
        set.insert("vendorNote", note);
    }

    let unset: &[&str] = match dto.decision {
        Decision::Accept => &["rejectReason"],
        Decision::Reject => {
            let reason = dto
                .reject_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
            set.insert("rejectReason", reason);
            &[]
        }
    };

    let booking = advance_booking(
        db,
        auth.role,
        doc! { "_id": booking_id, "vendorId": vendor.id },
        BookingAction::from(dto.decision),
        set,
        unset,
    )
    .await?;

    Ok(Json(booking.into()))
}

/// Mark a confirmed booking as completed
#[openapi(tag = "Vendor Bookings")]
#[patch("/vendors/me/bookings/<id>/complete")]
pub async fn complete_booking(
    db: &State<DbConn>,
    auth: VendorAuth,
    id: String,
) -> Result<Json<BookingResponse>, ApiError> {
    let vendor = vendor_for(db, auth.user_id).await?;
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;

    let booking = advance_booking(
        db,
        auth.role,
        doc! { "_id": booking_id, "vendorId": vendor.id },
        BookingAction::Complete,
        Document::new(),
        &[],
    )
    .await?;

    Ok(Json(booking.into()))
}
