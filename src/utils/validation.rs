use chrono::{DateTime as ChronoDateTime, NaiveDate, Utc};
use mongodb::bson::{DateTime, Regex as BsonRegex, oid::ObjectId};
use regex::Regex;
use serde_json::json;
use std::str::FromStr;
use std::sync::LazyLock;

use super::ApiError;

pub const DEFAULT_PAGE_LIMIT: u64 = 20;
pub const MAX_PAGE_LIMIT: u64 = 50;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercases and collapses every run of non-alphanumerics into a single `-`.
pub fn slugify(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Path ids that do not parse can never match a document.
pub fn parse_id_or_not_found(raw: &str, message: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::not_found(message))
}

pub fn parse_id(raw: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {}", field)))
}

/// Blank strings count as absent, anything else must be an ObjectId.
pub fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<ObjectId>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value, field).map(Some),
    }
}

/// Optional enum filter from a query string; blank means no filter.
pub fn parse_filter<T: FromStr>(raw: Option<&str>, message: &str) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(message)),
    }
}

pub fn parse_ids(raw: &[String], field: &str) -> Result<Vec<ObjectId>, ApiError> {
    raw.iter().map(|id| parse_id(id, field)).collect()
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<DateTime> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(DateTime::from_millis(midnight.timestamp_millis()));
    }

    ChronoDateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| DateTime::from_millis(dt.with_timezone(&Utc).timestamp_millis()))
}

/// Case-insensitive substring match on user input, with regex metacharacters escaped.
pub fn contains_ignore_case(term: &str) -> BsonRegex {
    BsonRegex {
        pattern: regex::escape(term.trim()),
        options: "i".to_string(),
    }
}

pub fn iso(dt: DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn from_query(page: Option<i64>, limit: Option<i64>) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT as i64);

        let mut problems = serde_json::Map::new();
        if page < 1 {
            problems.insert("page".into(), json!(["must be at least 1"]));
        }
        if !(1..=MAX_PAGE_LIMIT as i64).contains(&limit) {
            problems.insert(
                "limit".into(),
                json!([format!("must be between 1 and {}", MAX_PAGE_LIMIT)]),
            );
        } else if page >= 1 && (page - 1).checked_mul(limit).is_none() {
            // The offset has to fit the driver's i64 skip.
            problems.insert("page".into(), json!(["is too large"]));
        }
        if !problems.is_empty() {
            return Err(ApiError::bad_request("Validation failed").with_details(problems.into()));
        }

        Ok(Pagination {
            page: page as u64,
            limit: limit as u64,
        })
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Photography"), "photography");
        assert_eq!(slugify("Makeup Artist"), "makeup-artist");
        assert_eq!(slugify("DJ / Music"), "dj-music");
        assert_eq!(slugify("Sound & Lighting"), "sound-lighting");
        assert_eq!(slugify("  --Kathmandu--  "), "kathmandu");
    }

    #[test]
    fn pagination_defaults() {
        let p = Pagination::from_query(None, None).unwrap();
        assert_eq!(p, Pagination { page: 1, limit: 20 });
        assert_eq!(p.skip(), 0);
    }

    #[test]
    fn pagination_skip() {
        let p = Pagination::from_query(Some(3), Some(10)).unwrap();
        assert_eq!(p.skip(), 20);
    }

    #[test]
    fn pagination_bounds() {
        assert!(Pagination::from_query(Some(0), None).is_err());
        assert!(Pagination::from_query(None, Some(0)).is_err());
        assert!(Pagination::from_query(None, Some(51)).is_err());
        assert!(Pagination::from_query(None, Some(50)).is_ok());

        let err = Pagination::from_query(Some(-1), Some(100)).unwrap_err();
        let details = err.details.unwrap();
        assert!(details.get("page").is_some());
        assert!(details.get("limit").is_some());
    }

    #[test]
    fn huge_pages_are_rejected_before_skip() {
        let err = Pagination::from_query(Some(i64::MAX), Some(50)).unwrap_err();
        assert_eq!(err.message, "Validation failed");
        assert!(err.details.unwrap().get("page").is_some());

        let last = i64::MAX / 50 + 1;
        let p = Pagination::from_query(Some(last), Some(50)).unwrap();
        assert!(p.skip() <= i64::MAX as u64);
        assert!(Pagination::from_query(Some(last + 1), Some(50)).is_err());
    }

    #[test]
    fn dates() {
        let day = parse_date("2026-03-14").unwrap();
        assert_eq!(iso(day), "2026-03-14T00:00:00Z");

        let stamp = parse_date("2026-03-14T10:30:00+05:45").unwrap();
        assert_eq!(iso(stamp), "2026-03-14T04:45:00Z");

        assert!(parse_date("14/03/2026").is_none());
        assert!(parse_date("2026-02-30").is_none());
    }

    #[test]
    fn optional_ids() {
        assert_eq!(parse_optional_id(None, "categoryId").unwrap(), None);
        assert_eq!(parse_optional_id(Some("  "), "categoryId").unwrap(), None);

        let id = ObjectId::new();
        assert_eq!(
            parse_optional_id(Some(&id.to_hex()), "categoryId").unwrap(),
            Some(id)
        );

        let err = parse_optional_id(Some("nope"), "categoryId").unwrap_err();
        assert_eq!(err.message, "Invalid categoryId");
    }

    #[test]
    fn enum_filters() {
        use crate::models::{Role, UserStatus, VerificationStatus};

        assert_eq!(parse_filter::<Role>(None, "Invalid role").unwrap(), None);
        assert_eq!(parse_filter::<Role>(Some(""), "Invalid role").unwrap(), None);
        assert_eq!(
            parse_filter::<Role>(Some("VENDOR"), "Invalid role").unwrap(),
            Some(Role::Vendor)
        );
        assert_eq!(
            parse_filter::<VerificationStatus>(Some(" RESUBMIT_REQUIRED "), "x").unwrap(),
            Some(VerificationStatus::ResubmitRequired)
        );

        let err = parse_filter::<UserStatus>(Some("BANNED"), "Invalid status").unwrap_err();
        assert_eq!(err.message, "Invalid status");
    }

    #[test]
    fn search_terms_are_escaped() {
        let regex = contains_ignore_case("a+b (c)");
        assert_eq!(regex.pattern, r"a\+b \(c\)");
        assert_eq!(regex.options, "i");
    }
}
