use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::hex;
use crate::utils::{iso, parse_date};

pub const EVENTS: &str = "events";

string_enum! {
    pub enum EventType {
        Wedding => "WEDDING",
        Engagement => "ENGAGEMENT",
        Birthday => "BIRTHDAY",
        Corporate => "CORPORATE",
        Party => "PARTY",
        Other => "OTHER",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    pub event_type: EventType,
    pub event_date: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn valid_event_date(raw: &str) -> Result<(), ValidationError> {
    match parse_date(raw) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("event_date")),
    }
}

fn budget_range(min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("budget_range")),
        _ => Ok(()),
    }
}

fn create_budget_range(dto: &CreateEventDto) -> Result<(), ValidationError> {
    budget_range(dto.budget_min, dto.budget_max)
}

fn update_budget_range(dto: &UpdateEventDto) -> Result<(), ValidationError> {
    budget_range(dto.budget_min, dto.budget_max)
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "create_budget_range", skip_on_field_errors = false))]
pub struct CreateEventDto {
    #[validate(length(min = 2))]
    pub title: String,
    pub event_type: EventType,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[validate(custom = "valid_event_date")]
    pub event_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location_text: Option<String>,
    pub location_id: Option<String>,
    #[validate(range(min = 1))]
    pub guest_count: Option<i32>,
    #[validate(range(min = 0.0))]
    pub budget_min: Option<f64>,
    #[validate(range(min = 0.0))]
    pub budget_max: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "update_budget_range", skip_on_field_errors = false))]
pub struct UpdateEventDto {
    #[validate(length(min = 2))]
    pub title: Option<String>,
    pub event_type: Option<EventType>,
    #[validate(custom = "valid_event_date")]
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location_text: Option<String>,
    pub location_id: Option<String>,
    #[validate(range(min = 1))]
    pub guest_count: Option<i32>,
    #[validate(range(min = 0.0))]
    pub budget_min: Option<f64>,
    #[validate(range(min = 0.0))]
    pub budget_max: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateEventDto {
    pub fn touches_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }

    /// Checks the budget the stored event would have after this patch.
    pub fn check_merged_budget(&self, current: &Event) -> Result<(), ValidationErrors> {
        let min = self.budget_min.or(current.budget_min);
        let max = self.budget_max.or(current.budget_max);

        budget_range(min, max).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add("__all__", e);
            errors
        })
    }
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct EventListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub event_type: EventType,
    pub event_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location_text: Option<String>,
    pub location_id: Option<String>,
    pub guest_count: Option<i32>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        EventResponse {
            id: hex(event.id),
            user_id: event.user_id.to_hex(),
            title: event.title,
            event_type: event.event_type,
            event_date: iso(event.event_date),
            start_time: event.start_time,
            end_time: event.end_time,
            location_text: event.location_text,
            location_id: event.location_id.map(|id| id.to_hex()),
            guest_count: event.guest_count,
            budget_min: event.budget_min,
            budget_max: event.budget_max,
            notes: event.notes,
            created_at: iso(event.created_at),
            updated_at: iso(event.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreateEventDto {
        serde_json::from_value(serde_json::json!({
            "title": "Sita & Ram wedding",
            "eventType": "WEDDING",
            "eventDate": "2026-11-20",
            "guestCount": 300,
            "budgetMin": 500000.0,
            "budgetMax": 900000.0
        }))
        .unwrap()
    }

    #[test]
    fn accepts_a_complete_event() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn rejects_unparseable_dates() {
        let mut event = dto();
        event.event_date = "next friday".into();
        assert!(event.validate().unwrap_err().field_errors().contains_key("event_date"));
    }

    #[test]
    fn rejects_inverted_budget_and_empty_guest_list() {
        let mut event = dto();
        event.budget_min = Some(1_000_000.0);
        event.guest_count = Some(0);
        let errors = event.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("guest_count"));
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn patch_is_checked_against_stored_budget() {
        let now = DateTime::now();
        let stored = Event {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            title: "Reception".into(),
            event_type: EventType::Wedding,
            event_date: now,
            start_time: None,
            end_time: None,
            location_text: None,
            location_id: None,
            guest_count: None,
            budget_min: Some(100_000.0),
            budget_max: Some(200_000.0),
            notes: None,
            created_at: now,
            updated_at: now,
        };

        let lower_max: UpdateEventDto =
            serde_json::from_value(serde_json::json!({ "budgetMax": 50_000.0 })).unwrap();
        assert!(lower_max.validate().is_ok());
        assert!(lower_max.touches_budget());
        assert!(lower_max.check_merged_budget(&stored).is_err());

        let raise_both: UpdateEventDto = serde_json::from_value(
            serde_json::json!({ "budgetMin": 300_000.0, "budgetMax": 400_000.0 }),
        )
        .unwrap();
        assert!(raise_both.check_merged_budget(&stored).is_ok());
    }

    #[test]
    fn unknown_event_type_fails_to_parse() {
        let parsed: Result<CreateEventDto, _> = serde_json::from_value(serde_json::json!({
            "title": "Launch",
            "eventType": "GALA",
            "eventDate": "2026-11-20"
        }));
        assert!(parsed.is_err());
    }
}
