use crate::{
    config::RetryPolicy,
    db::{self, Pool},
    error::AppError,
    models::{NewUser, User},
};
use diesel::pg::PgConnection;
use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// Everything a request needs, shared across all workers.
pub struct AppState {
    pool: Pool,
    retry: RetryPolicy,
    schema_ready: AtomicBool,
    // held while creating the table; concurrent CREATE TABLE IF NOT EXISTS collides in postgres
    schema_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pool: Pool, retry: RetryPolicy, schema_ready: bool) -> Self {
        AppState {
            pool,
            retry,
            schema_ready: AtomicBool::new(schema_ready),
            schema_lock: Mutex::new(()),
        }
    }

    pub fn schema_ready(&self) -> bool {
        self.schema_ready.load(Ordering::SeqCst)
    }

    /// Insert `submission` if there is one, then return every registered user.
    ///
    /// Blocks for the duration of the retry budget when the database is down.
    pub fn register_and_list(&self, submission: Option<NewUser>) -> Result<Vec<User>, AppError> {
        let conn = db::acquire(&self.pool, &self.retry).ok_or(AppError::NoConnection)?;

        if !self.schema_ready() {
            self.ensure_schema(&conn)?;
        }

        if let Some(new_user) = submission {
            let user = db::insert_user(&conn, &new_user)?;
            info!("Registered user {} ({})", user.id, user.username);
        }

        Ok(db::list_users(&conn)?)
    }

    fn ensure_schema(&self, conn: &PgConnection) -> Result<(), AppError> {
        let _guard = self
            .schema_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if self.schema_ready() {
            return Ok(());
        }

        db::create_schema(conn)?;
        self.schema_ready.store(true, Ordering::SeqCst);
        info!("Database initialized on first request.");
        Ok(())
    }
}
