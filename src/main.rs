use std::sync::Arc;

use arena_domain::app::construct_app;
use arena_persistence_sqlite::{
    SqliteDatabaseHealth, create_db_pool, events::SqliteEventRepository, init_schema,
    matches::SqliteMatchRepository, players::SqlitePlayerRepository,
    transactions::SqliteTransactionRepository,
};
use arena_server_api::{
    ApiState,
    metrics::{ApiMetrics, PrometheusMetricsSink},
};
use log::{LevelFilter, info};
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

fn init_logger() {
    let file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/arena-server.log".to_string());
    let archive_pattern = std::env::var("LOG_ARCHIVE_PATTERN")
        .unwrap_or_else(|_| "logs/arena-server.{}.log.gz".to_string());

    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, LOG_FILE_COUNT)
        .unwrap();
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = log4rs::append::rolling_file::RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(file_path, Box::new(policy))
        .unwrap();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(stderr_level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("logfile")
                .appender("stderr")
                .build(LevelFilter::Trace),
        )
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    init_logger();

    let pool = create_db_pool().await.expect("Failed to open database");
    init_schema(&pool).await.expect("Failed to apply schema");

    let metrics = Arc::new(ApiMetrics::new());

    let app = construct_app(
        Arc::new(Box::new(SqlitePlayerRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteMatchRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteTransactionRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteEventRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteDatabaseHealth::new(pool))),
        Arc::new(Box::new(PrometheusMetricsSink::new(metrics.clone()))),
    );

    info!("Starting arena server");

    arena_server_api::run(ApiState { app, metrics }, shutdown_signal()).await;
}
