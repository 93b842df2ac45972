pub mod auth;
pub mod json;

pub use auth::{AdminAuth, AuthUser, CustomerAuth, VendorAuth};
pub use json::{OptionalJson, ValidJson};

use rocket::Request;

use crate::utils::ApiError;

/// Error left behind by a failing guard for the catcher to render.
pub struct GuardFailure(Option<ApiError>);

pub(crate) fn reject(req: &Request<'_>, err: ApiError) {
    req.local_cache(|| GuardFailure(Some(err)));
}

/// The error recorded for this request, if a guard rejected it.
pub fn failure(req: &Request<'_>) -> Option<ApiError> {
    req.local_cache(|| GuardFailure(None)).0.clone()
}
