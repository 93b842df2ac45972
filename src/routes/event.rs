use mongodb::bson::{DateTime, Document, doc};
use rocket::State;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use super::return_updated;
use crate::db::{self, DbConn};
use crate::guards::{CustomerAuth, ValidJson};
use crate::models::{
    CreateEventDto, EVENTS, Event, EventListQuery, EventResponse, UpdateEventDto, hex,
};
use crate::utils::{
    ApiError, Page, Pagination, parse_date, parse_id_or_not_found, parse_optional_id,
};

fn event_date(raw: &str) -> Result<DateTime, ApiError> {
    parse_date(raw).ok_or_else(|| ApiError::bad_request("Invalid eventDate"))
}

/// Create an event
#[openapi(tag = "Events")]
#[post("/events", data = "<dto>")]
pub async fn create_event(
    db: &State<DbConn>,
    auth: CustomerAuth,
    dto: ValidJson<CreateEventDto>,
) -> Result<Created<Json<EventResponse>>, ApiError> {
    let dto = dto.into_inner();
    let now = DateTime::now();

    let mut event = Event {
        id: None,
        user_id: auth.user_id,
        title: dto.title.trim().to_string(),
        event_type: dto.event_type,
        event_date: event_date(&dto.event_date)?,
        start_time: dto.start_time,
        end_time: dto.end_time,
        location_text: dto.location_text,
        location_id: parse_optional_id(dto.location_id.as_deref(), "locationId")?,
        guest_count: dto.guest_count,
        budget_min: dto.budget_min,
        budget_max: dto.budget_max,
        notes: dto.notes,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Event>(EVENTS)
        .insert_one(&event, None)
        .await?;
    event.id = result.inserted_id.as_object_id();

    let location = format!("/api/events/{}", hex(event.id));
    Ok(Created::new(location).body(Json(event.into())))
}

/// List my events, latest event date first
#[openapi(tag = "Events")]
#[get("/events?<query..>")]
pub async fn list_events(
    db: &State<DbConn>,
    auth: CustomerAuth,
    query: EventListQuery,
) -> Result<Json<Page<EventResponse>>, ApiError> {
    let pagination = Pagination::from_query(query.page, query.limit)?;

    let (events, total) = db::find_page(
        &db.collection::<Event>(EVENTS),
        doc! { "userId": auth.user_id },
        doc! { "eventDate": -1 },
        pagination,
    )
    .await?;

    let items = events.into_iter().map(EventResponse::from).collect();
    Ok(Json(Page::new(items, pagination, total)))
}

/// Get my event
#[openapi(tag = "Events")]
#[get("/events/<id>")]
pub async fn get_event(
    db: &State<DbConn>,
    auth: CustomerAuth,
    id: String,
) -> Result<Json<EventResponse>, ApiError> {
    let event_id = parse_id_or_not_found(&id, "Event not found")?;

    let event = db
        .collection::<Event>(EVENTS)
        .find_one(doc! { "_id": event_id, "userId": auth.user_id }, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    Ok(Json(event.into()))
}

/// Update my event
#[openapi(tag = "Events")]
#[patch("/events/<id>", data = "<dto>")]
pub async fn update_event(
    db: &State<DbConn>,
    auth: CustomerAuth,
    id: String,
    dto: ValidJson<UpdateEventDto>,
) -> Result<Json<EventResponse>, ApiError> {
    let event_id = parse_id_or_not_found(&id, "Event not found")?;
    let dto = dto.into_inner();
    let events = db.collection::<Event>(EVENTS);
    let scope = doc! { "_id": event_id, "userId": auth.user_id };

    if dto.touches_budget() {
        let current = events
            .find_one(scope.clone(), None)
            .await?
            .ok_or_else(|| ApiError::not_found("Event not found"))?;
        dto.check_merged_budget(&current)?;
    }

    let mut updates = Document::new();
    if let Some(title) = dto.title {
        updates.insert("title", title.trim());
    }
    if let Some(event_type) = dto.event_type {
        updates.insert("eventType", event_type);
    }
    if let Some(raw) = dto.event_date {
        updates.insert("eventDate", event_date(&raw)?);
    }
    if let Some(start_time) = dto.start_time {
        updates.insert("startTime", start_time);
    }
    if let Some(end_time) = dto.end_time {
        updates.insert("endTime", end_time);
    }
    if let Some(location_text) = dto.location_text {
        updates.insert("locationText", location_text);
    }
    if let Some(location_id) = parse_optional_id(dto.location_id.as_deref(), "locationId")? {
        updates.insert("locationId", location_id);
    }
    if let Some(guest_count) = dto.guest_count {
        updates.insert("guestCount", guest_count);
    }
    if let Some(budget_min) = dto.budget_min {
        updates.insert("budgetMin", budget_min);
    }
    if let Some(budget_max) = dto.budget_max {
        updates.insert("budgetMax", budget_max);
    }
    if let Some(notes) = dto.notes {
        updates.insert("notes", notes);
    }
    updates.insert("updatedAt", DateTime::now());

    let event = events
        .find_one_and_update(scope, doc! { "$set": updates }, return_updated())
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    Ok(Json(event.into()))
}
