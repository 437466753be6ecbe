//! Postgres meeting store implemented with Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Meeting and slots written in a single transaction
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{ErrorContext, MeetingRepository, RepositoryError, RepositoryResult};
use crate::models::{Meeting, MeetingDetail, MeetingId, NewMeeting, Slot, TimeInterval, UserId};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed meeting store.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self { pool, config })
    }

    /// Run `f` on a pooled connection off the async runtime, retrying
    /// retryable failures with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::warn!("retrying after transient database error: {}", e);
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn insert_slots(
    conn: &mut PgConnection,
    meeting_id: MeetingId,
    slots: &[TimeInterval],
) -> RepositoryResult<Vec<Slot>> {
    let rows: Vec<NewSlotRow> = slots
        .iter()
        .map(|interval| NewSlotRow::new(meeting_id, interval))
        .collect();

    let mut stored: Vec<Slot> = diesel::insert_into(meeting_slots::table)
        .values(&rows)
        .returning(SlotRow::as_returning())
        .get_results::<SlotRow>(conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                RepositoryError::not_found_with_context(
                    format!("meeting {} does not exist", meeting_id),
                    ErrorContext::new("add_slot")
                        .with_entity("meeting")
                        .with_entity_id(meeting_id),
                )
            }
            other => map_diesel_error(other),
        })?
        .into_iter()
        .map(Slot::from)
        .collect();

    stored.sort_by_key(|s| (s.start_time, s.slot_id));
    Ok(stored)
}

#[async_trait]
impl MeetingRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create_meeting(&self, meeting: &NewMeeting) -> RepositoryResult<Meeting> {
        let row = NewMeetingRow::from(meeting);
        self.with_conn(move |conn| {
            diesel::insert_into(meetings::table)
                .values(&row)
                .returning(MeetingRow::as_returning())
                .get_result::<MeetingRow>(conn)
                .map(Meeting::from)
                .map_err(|e| map_diesel_error(e).with_operation("create_meeting"))
        })
        .await
    }

    async fn add_slot(
        &self,
        meeting_id: MeetingId,
        interval: &TimeInterval,
    ) -> RepositoryResult<Slot> {
        let interval = *interval;
        self.with_conn(move |conn| {
            insert_slots(conn, meeting_id, std::slice::from_ref(&interval))?
                .pop()
                .ok_or_else(|| RepositoryError::internal("slot insert returned no row"))
        })
        .await
    }

    async fn get_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<Option<Meeting>> {
        self.with_conn(move |conn| {
            meetings::table
                .find(meeting_id.value())
                .select(MeetingRow::as_select())
                .first::<MeetingRow>(conn)
                .optional()
                .map(|row| row.map(Meeting::from))
                .map_err(|e| map_diesel_error(e).with_operation("get_meeting"))
        })
        .await
    }

    async fn list_slots(&self, meeting_id: MeetingId) -> RepositoryResult<Vec<Slot>> {
        self.with_conn(move |conn| {
            meeting_slots::table
                .filter(meeting_slots::meeting_id.eq(meeting_id.value()))
                .order((meeting_slots::start_time.asc(), meeting_slots::slot_id.asc()))
                .select(SlotRow::as_select())
                .load::<SlotRow>(conn)
                .map(|rows| rows.into_iter().map(Slot::from).collect())
                .map_err(|e| map_diesel_error(e).with_operation("list_slots"))
        })
        .await
    }

    async fn list_meetings_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Meeting>> {
        self.with_conn(move |conn| {
            meetings::table
                .filter(meetings::organizer_id.eq(owner.value()))
                .order((meetings::created_at.desc(), meetings::meeting_id.desc()))
                .select(MeetingRow::as_select())
                .load::<MeetingRow>(conn)
                .map(|rows| rows.into_iter().map(Meeting::from).collect())
                .map_err(|e| map_diesel_error(e).with_operation("list_meetings_by_owner"))
        })
        .await
    }

    async fn delete_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<u64> {
        // meeting_slots rows go with it through ON DELETE CASCADE
        self.with_conn(move |conn| {
            diesel::delete(meetings::table.find(meeting_id.value()))
                .execute(conn)
                .map(|n| n as u64)
                .map_err(|e| map_diesel_error(e).with_operation("delete_meeting"))
        })
        .await
    }

    async fn create_meeting_with_slots(
        &self,
        meeting: &NewMeeting,
        slots: &[TimeInterval],
    ) -> RepositoryResult<MeetingDetail> {
        let row = NewMeetingRow::from(meeting);
        let slots = slots.to_vec();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let created: Meeting = diesel::insert_into(meetings::table)
                    .values(&row)
                    .returning(MeetingRow::as_returning())
                    .get_result::<MeetingRow>(tx)
                    .map(Meeting::from)
                    .map_err(map_diesel_error)?;

                let stored = if slots.is_empty() {
                    Vec::new()
                } else {
                    insert_slots(tx, created.meeting_id, &slots)?
                };

                Ok(MeetingDetail {
                    meeting: created,
                    slots: stored,
                })
            })
            .map_err(|e| e.with_operation("create_meeting_with_slots"))
        })
        .await
    }
}
