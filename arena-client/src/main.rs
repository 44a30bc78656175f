use std::time::Duration;

use arena_client::{
    ArenaClient,
    simulator::{SimulationMode, Simulator},
};
use log::{LevelFilter, info};
use log4rs::{
    Config,
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};

fn init_logger() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} - {m}\n")))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    init_logger();

    let api_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
    let mode = SimulationMode::parse_lossy(
        &std::env::var("SIMULATION_MODE").unwrap_or_else(|_| "normal".to_string()),
    );
    let interval_seconds = std::env::var("CYCLE_INTERVAL")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);

    info!(
        "Traffic simulator targeting {} (mode: {}, cycle interval: {}s)",
        api_url,
        mode.as_str(),
        interval_seconds
    );

    let client = ArenaClient::new(api_url);
    let mut simulator = Simulator::new(client, mode);

    tokio::select! {
        _ = simulator.run(Duration::from_secs(interval_seconds)) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Simulator stopped");
        }
    }
}
