use mongodb::bson::{DateTime, oid::ObjectId};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use super::{Role, hex};
use crate::utils::iso;

pub const BOOKINGS: &str = "bookings";

string_enum! {
    pub enum BookingStatus {
        Requested => "REQUESTED",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Cancelled => "CANCELLED",
        Confirmed => "CONFIRMED",
        Completed => "COMPLETED",
    }
}

string_enum! {
    pub enum BookingAction {
        Accept => "ACCEPT",
        Reject => "REJECT",
        Cancel => "CANCEL",
        Confirm => "CONFIRM",
        Complete => "COMPLETE",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .action.requirement())]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub action: BookingAction,
}

impl BookingAction {
    /// Only this role may perform the action.
    pub fn actor(self) -> Role {
        match self {
            BookingAction::Accept | BookingAction::Reject | BookingAction::Complete => Role::Vendor,
            BookingAction::Cancel | BookingAction::Confirm => Role::Customer,
        }
    }

    /// Booking field stamped with the time the action happened.
    pub fn timestamp_field(self) -> &'static str {
        match self {
            BookingAction::Accept | BookingAction::Reject => "decisionAt",
            BookingAction::Cancel => "cancelledAt",
            BookingAction::Confirm => "confirmedAt",
            BookingAction::Complete => "completedAt",
        }
    }

    fn requirement(self) -> &'static str {
        match self {
            BookingAction::Accept | BookingAction::Reject => {
                "Only REQUESTED bookings can be accepted/rejected"
            }
            BookingAction::Cancel => "Only REQUESTED or ACCEPTED bookings can be cancelled",
            BookingAction::Confirm => "Only ACCEPTED bookings can be confirmed",
            BookingAction::Complete => "Only CONFIRMED bookings can be completed",
        }
    }
}

impl BookingStatus {
    /// The whole lifecycle lives here:
    ///
    /// ```text
    /// REQUESTED --accept--> ACCEPTED --confirm--> CONFIRMED --complete--> COMPLETED
    ///     |                     |
    ///     +--reject--> REJECTED +--cancel--> CANCELLED
    ///     +--cancel--> CANCELLED
    /// ```
    pub fn transition(self, action: BookingAction) -> Result<BookingStatus, InvalidTransition> {
        use BookingAction as A;
        use BookingStatus as S;

        let next = match (self, action) {
            (S::Requested, A::Accept) => S::Accepted,
            (S::Requested, A::Reject) => S::Rejected,
            (S::Requested | S::Accepted, A::Cancel) => S::Cancelled,
            (S::Accepted, A::Confirm) => S::Confirmed,
            (S::Confirmed, A::Complete) => S::Completed,
            (from, action) => return Err(InvalidTransition { from, action }),
        };
        Ok(next)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub vendor_id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<ObjectId>,
    pub event_id: ObjectId,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub requested_at: DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingDto {
    #[validate(length(min = 1))]
    pub vendor_id: String,
    pub package_id: Option<String>,
    #[validate(length(min = 1))]
    pub event_id: String,
    pub customer_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Accept,
    Reject,
}

impl From<Decision> for BookingAction {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accept => BookingAction::Accept,
            Decision::Reject => BookingAction::Reject,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorDecisionDto {
    pub decision: Decision,
    pub vendor_note: Option<String>,
    pub reject_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct CancelBookingDto {
    pub reason: Option<String>,
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub vendor_id: String,
    pub package_id: Option<String>,
    pub event_id: String,
    pub status: BookingStatus,
    pub customer_note: Option<String>,
    pub vendor_note: Option<String>,
    pub reject_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub requested_at: String,
    pub decision_at: Option<String>,
    pub confirmed_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        BookingResponse {
            id: hex(booking.id),
            user_id: booking.user_id.to_hex(),
            vendor_id: booking.vendor_id.to_hex(),
            package_id: booking.package_id.map(|id| id.to_hex()),
            event_id: booking.event_id.to_hex(),
            status: booking.status,
            customer_note: booking.customer_note,
            vendor_note: booking.vendor_note,
            reject_reason: booking.reject_reason,
            cancel_reason: booking.cancel_reason,
            requested_at: iso(booking.requested_at),
            decision_at: booking.decision_at.map(iso),
            confirmed_at: booking.confirmed_at.map(iso),
            completed_at: booking.completed_at.map(iso),
            cancelled_at: booking.cancelled_at.map(iso),
            created_at: iso(booking.created_at),
            updated_at: iso(booking.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingAction as A;
    use BookingStatus as S;

    #[test]
    fn happy_path() {
        let status = S::Requested
            .transition(A::Accept)
            .and_then(|s| s.transition(A::Confirm))
            .and_then(|s| s.transition(A::Complete))
            .unwrap();
        assert_eq!(status, S::Completed);
    }

    #[test]
    fn allowed_transitions() {
        let allowed = [
            (S::Requested, A::Accept, S::Accepted),
            (S::Requested, A::Reject, S::Rejected),
            (S::Requested, A::Cancel, S::Cancelled),
            (S::Accepted, A::Cancel, S::Cancelled),
            (S::Accepted, A::Confirm, S::Confirmed),
            (S::Confirmed, A::Complete, S::Completed),
        ];

        for from in S::ALL {
            for action in A::ALL {
                let expected = allowed
                    .iter()
                    .find(|(f, a, _)| f == from && a == action)
                    .map(|(_, _, to)| *to);
                assert_eq!(
                    from.transition(*action).ok(),
                    expected,
                    "{} --{}-->",
                    from,
                    action
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for status in [S::Rejected, S::Cancelled, S::Completed] {
            for action in A::ALL {
                assert!(status.transition(*action).is_err());
            }
        }
    }

    #[test]
    fn decision_error_message() {
        let err = S::Accepted.transition(A::Reject).unwrap_err();
        assert_eq!(err.to_string(), "Only REQUESTED bookings can be accepted/rejected");
        assert_eq!(err.from, S::Accepted);
    }

    #[test]
    fn actors() {
        assert_eq!(A::Accept.actor(), Role::Vendor);
        assert_eq!(A::Complete.actor(), Role::Vendor);
        assert_eq!(A::Cancel.actor(), Role::Customer);
        assert_eq!(A::Confirm.actor(), Role::Customer);
    }

    #[test]
    fn responses_keep_the_document_id_key() {
        let now = DateTime::now();
        let id = ObjectId::new();
        let booking = Booking {
            id: Some(id),
            user_id: ObjectId::new(),
            vendor_id: ObjectId::new(),
            package_id: None,
            event_id: ObjectId::new(),
            status: S::Requested,
            customer_note: None,
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

        let json = serde_json::to_value(BookingResponse::from(booking)).unwrap();
        assert_eq!(json["_id"], id.to_hex());
        assert!(json.get("id").is_none());
        assert_eq!(json["status"], "REQUESTED");
    }

    #[test]
    fn wire_names() {
        assert_eq!(S::Requested.as_str(), "REQUESTED");
        assert_eq!("COMPLETED".parse::<S>().unwrap(), S::Completed);
        assert!("completed".parse::<S>().is_err());
        let decision: Decision = serde_json::from_str("\"REJECT\"").unwrap();
        assert_eq!(BookingAction::from(decision), A::Reject);
    }
}
