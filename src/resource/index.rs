use crate::state::AppState;
use actix_web::{web, Error, HttpResponse};
use futures::Future;

pub fn index(state: web::Data<AppState>) -> impl Future<Item = HttpResponse, Error = Error> {
    super::user_page(move || state.register_and_list(None))
}
