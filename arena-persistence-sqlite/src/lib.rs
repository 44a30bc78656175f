use arena_domain::{ServiceError, ServiceResult, health::DatabaseHealth};
use log::info;
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod events;
pub mod matches;
pub mod players;
pub mod transactions;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT,
    level INTEGER NOT NULL DEFAULT 1,
    total_points INTEGER NOT NULL DEFAULT 0,
    account_balance REAL NOT NULL DEFAULT 0.0,
    created_at TEXT NOT NULL,
    last_login TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_players_username ON players (username);
CREATE INDEX IF NOT EXISTS idx_players_last_login ON players (last_login);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_type TEXT NOT NULL,
    status TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    winner_id INTEGER REFERENCES players (id),
    duration_seconds INTEGER,
    server_region TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_matches_status ON matches (status);
CREATE INDEX IF NOT EXISTS idx_matches_start_time ON matches (start_time);

CREATE TABLE IF NOT EXISTS match_participants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id INTEGER NOT NULL REFERENCES matches (id),
    player_id INTEGER NOT NULL REFERENCES players (id),
    score INTEGER NOT NULL DEFAULT 0,
    kills INTEGER NOT NULL DEFAULT 0,
    deaths INTEGER NOT NULL DEFAULT 0,
    joined_at TEXT NOT NULL,
    left_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_participants_match ON match_participants (match_id);
CREATE INDEX IF NOT EXISTS idx_participants_player ON match_participants (player_id);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES players (id),
    item_type TEXT NOT NULL,
    item_name TEXT NOT NULL,
    amount REAL NOT NULL,
    currency TEXT NOT NULL DEFAULT 'USD',
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transactions_created_at ON transactions (created_at);
CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions (status);

CREATE TABLE IF NOT EXISTS system_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    message TEXT NOT NULL,
    metadata TEXT,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_timestamp ON system_events (timestamp);
";

pub fn internal_error(e: sqlx::Error) -> ServiceError {
    ServiceError::Internal(e.to_string())
}

pub async fn create_db_pool() -> ServiceResult<Pool<Sqlite>> {
    let url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://arena.db".to_string());
    let options = url
        .parse::<SqliteConnectOptions>()
        .map_err(internal_error)?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(internal_error)?;
    info!("Connected to database at {}", url);
    Ok(pool)
}

pub async fn init_schema(pool: &Pool<Sqlite>) -> ServiceResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(internal_error)?;
    info!("Database schema ready");
    Ok(())
}

pub struct SqliteDatabaseHealth {
    pool: Pool<Sqlite>,
}

impl SqliteDatabaseHealth {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DatabaseHealth for SqliteDatabaseHealth {
    async fn ping(&self) -> ServiceResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(internal_error)?;
        Ok(())
    }
}
