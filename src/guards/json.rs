use rocket::data::{self, Data, FromData};
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RequestBody;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::request::OpenApiFromData;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::reject;
use crate::utils::ApiError;

/// JSON body that has been parsed and passed its `validator` rules.
///
/// Parse failures and rule violations both end in a 400 rendered by the
/// catcher with the reason attached.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T> ValidJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for ValidJson<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromData<'r> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    type Error = ();

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        let err = match Json::<T>::from_data(req, data).await {
            data::Outcome::Success(Json(value)) => match value.validate() {
                Ok(()) => return data::Outcome::Success(ValidJson(value)),
                Err(errors) => ApiError::validation(errors),
            },
            data::Outcome::Error((_, e)) => {
                ApiError::bad_request("Invalid request body").with_details(e.to_string().into())
            }
            data::Outcome::Forward(forward) => return data::Outcome::Forward(forward),
        };

        let status = err.status;
        reject(req, err);
        data::Outcome::Error((status, ()))
    }
}

impl<'r, T> OpenApiFromData<'r> for ValidJson<T>
where
    T: JsonSchema + DeserializeOwned + Validate + Send + 'static,
{
    fn request_body(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<RequestBody> {
        Json::<T>::request_body(generator)
    }
}

/// [`ValidJson`] for endpoints where the body may be left out entirely.
///
/// Only an empty body yields `None`; a body that is present must still
/// parse and validate.
#[derive(Debug)]
pub struct OptionalJson<T>(pub Option<T>);

impl<T> OptionalJson<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromData<'r> for OptionalJson<T>
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    type Error = ();

    async fn from_data(req: &'r Request<'_>, mut data: Data<'r>) -> data::Outcome<'r, Self> {
        if data.peek(1).await.is_empty() && data.peek_complete() {
            return data::Outcome::Success(OptionalJson(None));
        }

        ValidJson::<T>::from_data(req, data)
            .await
            .map(|ValidJson(value)| OptionalJson(Some(value)))
    }
}

impl<'r, T> OpenApiFromData<'r> for OptionalJson<T>
where
    T: JsonSchema + DeserializeOwned + Validate + Send + 'static,
{
    fn request_body(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<RequestBody> {
        let mut body = Json::<T>::request_body(generator)?;
        body.required = false;
        Ok(body)
    }
}
