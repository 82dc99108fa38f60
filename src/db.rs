use crate::{
    config::{Config, RetryPolicy},
    error::AppError,
    models::{NewUser, User},
    schema::users,
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{error, info, warn};
use std::{fmt::Display, thread};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

static CREATE_USERS: &'static str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL,
        email VARCHAR(100) NOT NULL
    )
"#;

/// Build the pool without touching the database; connections are opened on demand.
pub fn build_pool(config: &Config) -> Pool {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url());
    r2d2::Pool::builder()
        .max_size(config.pool_size)
        .min_idle(Some(0))
        .connection_timeout(config.connect_timeout)
        .build_unchecked(manager)
}

/// Run `attempt` until it succeeds or the policy's attempts are spent.
///
/// Exhaustion is reported as `None` rather than an error so callers can pick
/// their own response to an unreachable database.
pub fn connect_with_retry<T, E, F>(policy: &RetryPolicy, mut attempt: F) -> Option<T>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
{
    for n in 1..=policy.attempts {
        match attempt() {
            Ok(conn) => return Some(conn),
            Err(e) => {
                warn!(
                    "Waiting for database (attempt {}/{}): {}",
                    n, policy.attempts, e
                );
                if n < policy.attempts {
                    thread::sleep(policy.delay);
                }
            }
        }
    }

    error!(
        "Database unreachable after {} attempts, giving up",
        policy.attempts
    );
    None
}

/// Check a connection out of the pool, retrying per `policy`.
pub fn acquire(pool: &Pool, policy: &RetryPolicy) -> Option<PooledConnection> {
    connect_with_retry(policy, || pool.get())
}

pub fn create_schema(conn: &PgConnection) -> QueryResult<()> {
    diesel::sql_query(CREATE_USERS).execute(conn)?;
    Ok(())
}

/// Ensure the `users` table exists. Safe to call any number of times.
pub fn init_schema(pool: &Pool, policy: &RetryPolicy) -> Result<(), AppError> {
    let conn = acquire(pool, policy).ok_or(AppError::NoConnection)?;
    create_schema(&conn)?;
    info!("Database initialized successfully.");
    Ok(())
}

pub fn insert_user(conn: &PgConnection, new_user: &NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(new_user)
        .get_result(conn)
}

pub fn list_users(conn: &PgConnection) -> QueryResult<Vec<User>> {
    users::table.order(users::id.asc()).load(conn)
}
