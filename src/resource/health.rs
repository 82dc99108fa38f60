use crate::state::AppState;
use actix_web::{web, Error, HttpRequest, HttpResponse, Responder};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    schema_ready: bool,
}

impl Responder for HealthResponse {
    type Error = Error;
    type Future = Result<HttpResponse, Error>;

    fn respond_to(self, _req: &HttpRequest) -> Self::Future {
        let body = serde_json::to_string(&self)?;
        let mut response = if self.schema_ready {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        Ok(response.content_type("application/json").body(body))
    }
}

/// Reports whether the schema is known to exist. Never touches the database.
pub fn health(state: web::Data<AppState>) -> HealthResponse {
    let schema_ready = state.schema_ready();
    HealthResponse {
        status: if schema_ready { "ok" } else { "degraded" },
        schema_ready,
    }
}
