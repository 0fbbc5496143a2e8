use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::{AppState, ClientState};
use crate::domain::ports::{BookingRepository, PackageOverrideRepository, PackageRepository, PendingBookingStore};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::availability::AvailabilityResolver;
use crate::domain::services::availability_service::AvailabilityService;
use crate::domain::services::recovery::PendingBookingRecovery;
use crate::infra::client::{
    http_availability_source::HttpAvailabilitySource, http_booking_gateway::HttpBookingGateway,
    session::ClientSession,
};
use crate::infra::clock::SystemClock;
use crate::infra::storage::{
    file_pending_store::FilePendingBookingStore, local_receipt_store::LocalReceiptStore,
    memory_pending_store::MemoryPendingBookingStore,
};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_package_repo::PostgresPackageRepo,
    postgres_package_override_repo::PostgresPackageOverrideRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_package_repo::SqlitePackageRepo,
    sqlite_package_override_repo::SqlitePackageOverrideRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        assemble(
            config,
            Arc::new(PostgresPackageRepo::new(pool.clone())),
            Arc::new(PostgresBookingRepo::new(pool.clone())),
            Arc::new(PostgresPackageOverrideRepo::new(pool)),
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        assemble(
            config,
            Arc::new(SqlitePackageRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SqlitePackageOverrideRepo::new(pool)),
        )
    }
}

fn assemble(
    config: &Config,
    package_repo: Arc<dyn PackageRepository>,
    booking_repo: Arc<dyn BookingRepository>,
    override_repo: Arc<dyn PackageOverrideRepository>,
) -> AppState {
    let availability = Arc::new(AvailabilityService::new(
        package_repo.clone(),
        booking_repo.clone(),
        override_repo.clone(),
        AvailabilityResolver::new(config.overlap_policy),
    ));
    info!("Preparation overlap policy: {:?}", config.overlap_policy);

    AppState {
        config: config.clone(),
        package_repo,
        booking_repo,
        override_repo,
        availability,
        receipt_store: Arc::new(LocalReceiptStore::new(&config.receipt_dir)),
        auth_service: Arc::new(AuthService::new(config.clone())),
        clock: Arc::new(SystemClock),
    }
}

/// Wires the booking client against the service at `API_BASE_URL`.
pub fn bootstrap_client(config: &Config) -> ClientState {
    let store: Arc<dyn PendingBookingStore> = match &config.pending_booking_dir {
        Some(dir) => {
            info!("Pending bookings are kept in {}", dir);
            Arc::new(FilePendingBookingStore::new(dir))
        }
        None => Arc::new(MemoryPendingBookingStore::new()),
    };

    let clock = Arc::new(SystemClock);
    let ttl = chrono::Duration::seconds(config.pending_booking_ttl_secs);

    ClientState {
        availability: Arc::new(HttpAvailabilitySource::new(config.api_base_url.clone())),
        gateway: Arc::new(HttpBookingGateway::new(config.api_base_url.clone())),
        recovery: Arc::new(PendingBookingRecovery::new(store, clock.clone(), ttl)),
        session: Arc::new(ClientSession::new()),
        clock,
        timezone: config.calendar_timezone,
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
