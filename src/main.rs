#[macro_use]
extern crate diesel;

mod config;
mod db;
mod error;
mod models;
mod render;
mod resource;
mod schema;
mod state;

use actix_web::{middleware, web, App, HttpServer};
use config::{Config, StartupPolicy};
use log::{error, info};
use state::AppState;

static RUST_LOG: &'static str = "RUST_LOG";

fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    if std::env::var_os(RUST_LOG).is_none() {
        std::env::set_var(RUST_LOG, "signup=info,actix_web=info");
    }
    env_logger::init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Using database {} on {}:{} as {}",
        config.name, config.host, config.port, config.user
    );

    let pool = db::build_pool(&config);
    let schema_ready = match db::init_schema(&pool, &config.retry) {
        Ok(()) => true,
        Err(e) => match config.startup {
            StartupPolicy::FailFast => {
                error!("Could not initialize database: {}", e);
                std::process::exit(1);
            }
            StartupPolicy::Degraded => {
                error!(
                    "Could not initialize database: {}. Serving in degraded mode; \
                     the users table will be created by the first request that reaches the database.",
                    e
                );
                false
            }
        },
    };

    let state = web::Data::new(AppState::new(pool, config.retry, schema_ready));

    info!("Starting HTTP server on {}...", config.bind);
    HttpServer::new(move || {
        App::new()
            .register_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(resource::configure)
    })
    .bind(config.bind.as_str())?
    .run()
}
