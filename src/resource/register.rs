use crate::{error::AppError, models::NewUser, state::AppState};
use actix_web::{web, Error, HttpResponse};
use futures::Future;
use serde::Deserialize;

/// Fields are optional here so a missing one becomes a 400 instead of an extractor fault.
#[derive(Deserialize)]
pub struct RegisterParams {
    username: Option<String>,
    email: Option<String>,
}

impl RegisterParams {
    pub fn validate(self) -> Result<NewUser, AppError> {
        Ok(NewUser {
            username: required(self.username, "username")?,
            email: required(self.email, "email")?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::MissingField(field)),
    }
}

pub fn register(
    params: web::Form<RegisterParams>,
    state: web::Data<AppState>,
) -> impl Future<Item = HttpResponse, Error = Error> {
    super::user_page(move || {
        let new_user = params.into_inner().validate()?;
        state.register_and_list(Some(new_user))
    })
}
