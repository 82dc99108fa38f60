pub mod health;
pub mod index;
pub mod register;

pub use health::health;
pub use index::index;
pub use register::register;

use crate::{error::AppError, models::User, render};
use actix_web::{error::BlockingError, web, Error, HttpResponse};
use futures::Future;

/// Routes
/// - /
///     - GET: registration form and user list
///     - POST { username, email }: register user, then same as GET
/// - /health
///     - GET: schema readiness as JSON
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to_async(index))
            .route(web::post().to_async(register)),
    )
    .service(web::resource("/health").route(web::get().to(health)));
}

/// Run the blocking database work off the worker thread and render its result.
fn user_page<F>(work: F) -> impl Future<Item = HttpResponse, Error = Error>
where
    F: FnOnce() -> Result<Vec<User>, AppError> + Send + 'static,
{
    web::block(work).then(|res| -> Result<HttpResponse, Error> {
        match res {
            Ok(users) => Ok(HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(render::page(&users))),
            Err(BlockingError::Error(e)) => Err(e.into()),
            Err(BlockingError::Canceled) => Err(AppError::Canceled.into()),
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::{Config, RetryPolicy, CONNECT_ATTEMPTS, DB_HOST, DB_PORT, RETRY_DELAY_SECS},
        db,
        schema::users,
        state::AppState,
    };
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };
    use diesel::prelude::*;
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    fn unreachable_state(schema_ready: bool) -> web::Data<AppState> {
        let config = Config::from_lookup(|name| {
            let value = match name {
                n if n == DB_HOST => "127.0.0.1",
                n if n == DB_PORT => "1",
                n if n == CONNECT_ATTEMPTS => "2",
                n if n == RETRY_DELAY_SECS => "0",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap();
        web::Data::new(AppState::new(
            db::build_pool(&config),
            config.retry,
            schema_ready,
        ))
    }

    fn live_state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            db::test::live_pool(),
            RetryPolicy::default(),
            false,
        ))
    }

    fn form<S: Into<String>>(body: S) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .set_payload(body.into())
    }

    fn body_text<B: AsRef<[u8]>>(body: B) -> String {
        String::from_utf8(body.as_ref().to_vec()).unwrap()
    }

    #[test]
    fn test_get_without_database() {
        let mut app = test::init_service(
            App::new()
                .register_data(unreachable_state(false))
                .configure(configure),
        );
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(test::read_body(resp)), "Database Connection Error");
    }

    #[test]
    fn test_post_without_database() {
        let mut app = test::init_service(
            App::new()
                .register_data(unreachable_state(false))
                .configure(configure),
        );
        let req = form("username=alice&email=alice%40example.com").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(test::read_body(resp)), "Database Connection Error");
    }

    #[test]
    fn test_post_missing_field() {
        let mut app = test::init_service(
            App::new()
                .register_data(unreachable_state(false))
                .configure(configure),
        );
        let req = form("username=alice").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(test::read_body(resp)),
            "missing required field: email"
        );
    }

    #[test]
    fn test_health_reports_ready() {
        let mut app = test::init_service(
            App::new()
                .register_data(unreachable_state(true))
                .configure(configure),
        );
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_text(test::read_body(resp)),
            r#"{"status":"ok","schema_ready":true}"#
        );
    }

    #[test]
    fn test_health_reports_degraded() {
        let mut app = test::init_service(
            App::new()
                .register_data(unreachable_state(false))
                .configure(configure),
        );
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_text(test::read_body(resp)),
            r#"{"status":"degraded","schema_ready":false}"#
        );
    }

    #[test]
    #[ignore] // needs a running PostgreSQL
    fn test_post_then_get_lists_user() {
        let _guard = db::test::live_lock();
        let mut app = test::init_service(
            App::new()
                .register_data(live_state())
                .configure(configure),
        );
        let entry = "<li>alice - alice@example.com</li>";

        let req = test::TestRequest::get().uri("/").to_request();
        let before = body_text(test::read_body(test::call_service(&mut app, req)));

        let req = form("username=alice&email=alice%40example.com").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&mut app, req);
        assert_eq!(resp.status(), StatusCode::OK);
        let after = body_text(test::read_body(resp));

        assert_eq!(
            after.matches(entry).count(),
            before.matches(entry).count() + 1
        );
        assert_eq!(
            after.matches("<li>").count(),
            before.matches("<li>").count() + 1
        );
        let tail = format!("{}\n    </ul>\n</body>\n</html>", entry);
        assert!(after.trim_end().ends_with(&tail));
    }

    #[test]
    #[ignore] // needs a running PostgreSQL
    fn test_get_does_not_insert() {
        let _guard = db::test::live_lock();
        let mut app = test::init_service(
            App::new()
                .register_data(live_state())
                .configure(configure),
        );

        let req = test::TestRequest::get().uri("/").to_request();
        let first = body_text(test::read_body(test::call_service(&mut app, req)));
        let req = test::TestRequest::get().uri("/").to_request();
        let second = body_text(test::read_body(test::call_service(&mut app, req)));

        assert_eq!(first, second);
    }

    #[test]
    #[ignore] // needs a running PostgreSQL
    fn test_concurrent_submissions() {
        let _guard = db::test::live_lock();
        let state = live_state();
        let tag = format!("concurrent-{}", std::process::id());
        let count = || -> i64 {
            let conn = db::test::live_pool().get().unwrap();
            users::table
                .filter(users::username.eq(&tag))
                .count()
                .get_result(&conn)
                .unwrap()
        };
        let before = count();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let state = state.clone();
                let barrier = barrier.clone();
                let body = format!("username={}&email={}%40example.com", tag, i);
                thread::spawn(move || {
                    let mut app = test::init_service(
                        App::new().register_data(state).configure(configure),
                    );
                    barrier.wait();
                    test::call_service(&mut app, form(body).to_request()).status()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), StatusCode::OK);
        }
        assert_eq!(count(), before + 2);
    }
}
