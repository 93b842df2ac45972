use log::{info, warn};
use mongodb::bson::{Bson, DateTime, Document, doc};
use rocket::State;
use rocket::http::Status;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::return_updated;
use crate::db::{self, DbConn};
use crate::guards::{CustomerAuth, OptionalJson, ValidJson};
use crate::models::{
    BOOKINGS, Booking, BookingAction, BookingListQuery, BookingResponse, BookingStatus,
    CancelBookingDto, CreateBookingDto, EVENTS, Event, PACKAGES, Package, Role, VENDORS, Vendor,
    hex,
};
use crate::utils::{
    ApiError, Page, Pagination, parse_filter, parse_id, parse_id_or_not_found, parse_optional_id,
};

/// Status filter from a list query; blank means no filter.
pub(crate) fn status_filter(raw: Option<&str>) -> Result<Option<BookingStatus>, ApiError> {
    parse_filter(raw, "Invalid status")
}

/// Applies `action`, performed by a caller with `role`, to the booking matched by `scope`.
pub(crate) async fn advance_booking(
    db: &DbConn,
    role: Role,
    scope: Document,
    action: BookingAction,
    set: Document,
    unset: &[&str],
) -> Result<Booking, ApiError> {
    if action.actor() != role {
        return Err(ApiError::forbidden("Insufficient role"));
    }

    let booking = db
        .collection::<Booking>(BOOKINGS)
        .find_one(scope.clone(), None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    apply_transition(db, scope, &booking, action, set, unset).await
}

/// Writes the status `action` leads to from `current`, plus `set` and `unset`.
///
/// The write only lands if the stored booking still has `current.status`, so
/// two racing requests cannot both move it; the loser gets a 409.
pub async fn apply_transition(
    db: &DbConn,
    scope: Document,
    current: &Booking,
    action: BookingAction,
    mut set: Document,
    unset: &[&str],
) -> Result<Booking, ApiError> {
    let next = current.status.transition(action)?;

    let now = DateTime::now();
    set.insert("status", next);
    set.insert(action.timestamp_field(), now);
    set.insert("updatedAt", now);

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        let fields: Document = unset.iter().map(|f| (f.to_string(), Bson::from(""))).collect();
        update.insert("$unset", fields);
    }

    let mut guarded = scope;
    guarded.insert("status", current.status);

    let updated = db
        .collection::<Booking>(BOOKINGS)
        .find_one_and_update(guarded, update, return_updated())
        .await?
        .ok_or_else(|| {
            warn!("booking {} changed while applying {}", hex(current.id), action);
            ApiError::new(Status::Conflict, "Booking status changed, please retry")
        })?;

    info!(
        "booking {} moved {} -> {} ({})",
        hex(updated.id),
        current.status,
        next,
        action
    );
    Ok(updated)
}

/// Request a booking
#[openapi(tag = "Bookings")]
#[post("/bookings", data = "<dto>")]
pub async fn create_booking(
    db: &State<DbConn>,
    auth: CustomerAuth,
    dto: ValidJson<CreateBookingDto>,
) -> Result<Created<Json<BookingResponse>>, ApiError> {
    let dto = dto.into_inner();

    let vendor_id = parse_id(&dto.vendor_id, "vendorId")?;
    let event_id = parse_id(&dto.event_id, "eventId")?;
    let package_id = parse_optional_id(dto.package_id.as_deref(), "packageId")?;

    db.collection::<Event>(EVENTS)
        .find_one(doc! { "_id": event_id, "userId": auth.user_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    db.collection::<Vendor>(VENDORS)
        .find_one(doc! { "_id": vendor_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;

    if let Some(package_id) = package_id {
        db.collection::<Package>(PACKAGES)
            .find_one(doc! { "_id": package_id, "vendorId": vendor_id }, None)
            .await?
            .ok_or_else(|| ApiError::not_found("Package not found for this vendor"))?;
    }

    let now = DateTime::now();
    let mut booking = Booking {
        id: None,
        user_id: auth.user_id,
        vendor_id,
        package_id,
        event_id,
        status: BookingStatus::Requested,
        customer_note: dto.customer_note,
        vendor_note: None,
        reject_reason: None,
        cancel_reason: None,
        requested_at: now,
        decision_at: None,
        confirmed_at: None,
        completed_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Booking>(BOOKINGS)
        .insert_one(&booking, None)
        .await?;
    booking.id = result.inserted_id.as_object_id();

    info!("customer {} requested vendor {}", auth.user_id, vendor_id);

    let location = format!("/api/bookings/{}", hex(booking.id));
    Ok(Created::new(location).body(Json(booking.into())))
}

/// List my bookings
#[openapi(tag = "Bookings")]
#[get("/bookings?<query..>")]
pub async fn list_bookings(
    db: &State<DbConn>,
    auth: CustomerAuth,
    query: BookingListQuery,
) -> Result<Json<Page<BookingResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;

    let mut filter = doc! { "userId": auth.user_id };
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

/// Get my booking
#[openapi(tag = "Bookings")]
#[get("/bookings/<id>")]
pub async fn get_booking(
    db: &State<DbConn>,
    auth: CustomerAuth,
    id: String,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;

    let booking = db
        .collection::<Booking>(BOOKINGS)
        .find_one(doc! { "_id": booking_id, "userId": auth.user_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    Ok(Json(booking.into()))
}

/// Cancel my booking (REQUESTED or ACCEPTED); the body is optional
#[openapi(tag = "Bookings")]
#[patch("/bookings/<id>/cancel", data = "<dto>")]
pub async fn cancel_booking(
    db: &State<DbConn>,
    auth: CustomerAuth,
    id: String,
    dto: OptionalJson<CancelBookingDto>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;
    let dto = dto.into_inner().unwrap_or_default();

    let mut set = Document::new();
    if let Some(reason) = dto.reason.filter(|r| !r.trim().is_empty()) {
        set.insert("cancelReason", reason.trim());
    }

    let booking = advance_booking(
        db,
        auth.role,
        doc! { "_id": booking_id, "userId": auth.user_id },
        BookingAction::Cancel,
        set,
        &[],
    )
    .await?;

    Ok(Json(booking.into()))
}

/// Confirm my accepted booking
#[openapi(tag = "Bookings")]
#[patch("/bookings/<id>/confirm")]
pub async fn confirm_booking(
    db: &State<DbConn>,
    auth: CustomerAuth,
    id: String,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_id_or_not_found(&id, "Booking not found")?;

    let booking = advance_booking(
        db,
        auth.role,
        doc! { "_id": booking_id, "userId": auth.user_id },
        BookingAction::Confirm,
        Document::new(),
        &[],
    )
    .await?;

    Ok(Json(booking.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_status_means_no_filter() {
        assert_eq!(status_filter(None).unwrap(), None);
        assert_eq!(status_filter(Some(" ")).unwrap(), None);
        assert_eq!(
            status_filter(Some("ACCEPTED")).unwrap(),
            Some(BookingStatus::Accepted)
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = status_filter(Some("accepted")).unwrap_err();
        assert_eq!(err.status, Status::BadRequest);
        assert_eq!(err.message, "Invalid status");
    }

    #[tokio::test]
    async fn actions_are_limited_to_their_actor() {
        // Never connects: the role check runs before any query.
        let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
            .await
            .unwrap();
        let db = client.database("evently_unit");

        for (role, action) in [
            (Role::Customer, BookingAction::Accept),
            (Role::Customer, BookingAction::Complete),
            (Role::Vendor, BookingAction::Cancel),
            (Role::Vendor, BookingAction::Confirm),
            (Role::Admin, BookingAction::Reject),
        ] {
            let err = advance_booking(&db, role, doc! {}, action, Document::new(), &[])
                .await
                .unwrap_err();
            assert_eq!(err.status, Status::Forbidden, "{role} {action}");
        }
    }
}
