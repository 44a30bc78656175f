//! Synthetic traffic generator that drives the public API the way a live
//! player population would: login waves, match lifecycles, purchases and the
//! occasional injected incident.

use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use log::{error, info, warn};
use rand::{Rng, seq::IndexedRandom};

use crate::{
    ArenaClient, CompleteMatchRequest, CrashMatchRequest, CreateTransactionRequest,
    LogEventRequest, MatchId, ParticipantStat, PlayerId, RegisterPlayerRequest, StartMatchRequest,
};

const SEED_TARGET_PLAYERS: usize = 1000;

const BASE_LOGINS_PER_CYCLE: f64 = 100.0;
const BASE_MATCHES_PER_CYCLE: f64 = 20.0;
const BASE_TRANSACTIONS_PER_CYCLE: f64 = 10.0;

const MATCH_CRASH_CHANCE: f64 = 0.02;
const CHAOS_CHANCE: f64 = 0.05;

const READINESS_RETRIES: u32 = 30;
const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(2);

const SERVER_REGIONS: [&str; 3] = ["us-east", "eu-west", "asia"];

// Weighted towards team matches.
const MATCH_TYPES: [&str; 4] = ["solo", "team", "team", "tournament"];

const CRASH_MESSAGES: [&str; 5] = [
    "Server timeout",
    "Memory overflow",
    "Network disconnection",
    "Unexpected exception",
    "Database deadlock",
];

const STORE_ITEMS: [(&str, &str, f64); 8] = [
    ("skin", "Dragon Armor", 9.99),
    ("weapon", "Legendary Sword", 14.99),
    ("currency", "1000 Gold", 4.99),
    ("skin", "Galaxy Wings", 19.99),
    ("weapon", "Fire Staff", 12.99),
    ("currency", "500 Gold", 2.99),
    ("skin", "Ice Crown", 24.99),
    ("weapon", "Shadow Blade", 16.99),
];

const CHAOS_EVENTS: [(&str, &str, &str); 6] = [
    ("database_slow", "error", "Database query exceeded 5s"),
    ("api_timeout", "error", "API endpoint timed out"),
    ("memory_leak", "warning", "Memory usage at 85%"),
    ("network_partition", "critical", "Network connection lost"),
    ("disk_full", "critical", "Disk usage at 95%"),
    ("high_cpu", "warning", "CPU usage at 90%"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationMode {
    Slow,
    Normal,
    Stress,
    Tournament,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Slow => "slow",
            SimulationMode::Normal => "normal",
            SimulationMode::Stress => "stress",
            SimulationMode::Tournament => "tournament",
        }
    }

    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "slow" => SimulationMode::Slow,
            "stress" => SimulationMode::Stress,
            "tournament" => SimulationMode::Tournament,
            _ => SimulationMode::Normal,
        }
    }

    fn multiplier(self) -> f64 {
        match self {
            SimulationMode::Slow => 0.5,
            SimulationMode::Normal => 1.0,
            SimulationMode::Stress => 5.0,
            SimulationMode::Tournament => 10.0,
        }
    }
}

/// Time-of-day traffic shape: evening peak, quiet nights, a lunch bump.
fn traffic_multiplier(hour: u32) -> f64 {
    match hour {
        18..=23 => 2.0,
        0..=6 => 0.3,
        12..=14 => 1.5,
        _ => 1.0,
    }
}

fn scaled_count(base: f64, time_mult: f64, mode_mult: f64) -> usize {
    (base * time_mult * mode_mult) as usize
}

struct ActiveMatch {
    match_id: MatchId,
    player_ids: Vec<PlayerId>,
    started: Instant,
    lifetime: Duration,
}

pub struct Simulator {
    client: ArenaClient,
    mode: SimulationMode,
    player_pool: Vec<PlayerId>,
    active_matches: Vec<ActiveMatch>,
}

impl Simulator {
    pub fn new(client: ArenaClient, mode: SimulationMode) -> Self {
        Self {
            client,
            mode,
            player_pool: Vec::new(),
            active_matches: Vec::new(),
        }
    }

    fn cycle_count(&self, base: f64) -> usize {
        let hour = Local::now().hour();
        scaled_count(base, traffic_multiplier(hour), self.mode.multiplier())
    }

    /// Player ids are dense and start at 1, so the pool is derived from the
    /// total player count instead of paging through the whole roster.
    async fn refresh_player_pool(&mut self) {
        match self.client.player_stats().await {
            Ok(stats) if stats.total_players > 0 => {
                self.player_pool = (1..=stats.total_players).collect();
            }
            Ok(_) => {
                warn!("No players found on the server");
                self.player_pool.clear();
            }
            Err(e) => {
                warn!("Failed to fetch player stats: {}", e);
                self.player_pool.clear();
            }
        }
    }

    async fn seed_initial_data(&mut self) {
        self.refresh_player_pool().await;
        let current = self.player_pool.len();
        if current >= SEED_TARGET_PLAYERS {
            info!(
                "Already have {} players (target: {})",
                current, SEED_TARGET_PLAYERS
            );
            return;
        }

        info!(
            "Seeding players: {} -> {}",
            current, SEED_TARGET_PLAYERS
        );
        let mut created = 0usize;
        for i in current + 1..=SEED_TARGET_PLAYERS {
            let level = {
                let mut rng = rand::rng();
                rng.random_range(1..=50)
            };
            let request = RegisterPlayerRequest {
                username: format!("player_{}", i),
                email: format!("player_{}@example.com", i),
                level,
            };
            match self.client.register_player(&request).await {
                Ok(_) => {
                    created += 1;
                    if created % 100 == 0 {
                        info!("Created {} players so far", created);
                    }
                }
                Err(e) => warn!("Failed to create player {}: {}", i, e),
            }
        }

        self.refresh_player_pool().await;
        info!("Seeding complete, pool now has {} players", self.player_pool.len());
    }

    fn sample_players(&self, count: usize) -> Vec<PlayerId> {
        let mut rng = rand::rng();
        self.player_pool
            .choose_multiple(&mut rng, count.min(self.player_pool.len()))
            .copied()
            .collect()
    }

    async fn simulate_logins(&self) -> usize {
        let player_ids = self.sample_players(self.cycle_count(BASE_LOGINS_PER_CYCLE));

        let mut success = 0usize;
        let mut failures = 0usize;
        for player_id in &player_ids {
            match self.client.login(*player_id).await {
                Ok(_) => success += 1,
                Err(_) => failures += 1,
            }
        }

        let total = success + failures;
        let success_rate = if total > 0 {
            success as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        info!(
            "Logins: {}/{} ({:.1}% success)",
            success, total, success_rate
        );
        success
    }

    async fn simulate_matches(&mut self) -> usize {
        let num_new = self.cycle_count(BASE_MATCHES_PER_CYCLE);

        let mut started = 0usize;
        for _ in 0..num_new {
            let (match_type, player_ids, region, lifetime) = {
                let mut rng = rand::rng();
                let match_type = *MATCH_TYPES.choose(&mut rng).unwrap_or(&"solo");
                let num_players = if match_type == "solo" {
                    2
                } else {
                    rng.random_range(4..=10)
                };
                let player_ids: Vec<PlayerId> = self
                    .player_pool
                    .choose_multiple(&mut rng, num_players.min(self.player_pool.len()))
                    .copied()
                    .collect();
                let region = *SERVER_REGIONS.choose(&mut rng).unwrap_or(&"us-east");
                let lifetime = Duration::from_secs(rng.random_range(5..=30));
                (match_type, player_ids, region, lifetime)
            };
            if player_ids.is_empty() {
                continue;
            }

            let request = StartMatchRequest {
                match_type: match_type.to_string(),
                player_ids: player_ids.clone(),
                server_region: region.to_string(),
            };
            match self.client.start_match(&request).await {
                Ok(response) => {
                    self.active_matches.push(ActiveMatch {
                        match_id: response.match_id,
                        player_ids,
                        started: Instant::now(),
                        lifetime,
                    });
                    started += 1;
                }
                Err(e) => warn!("Failed to start match: {}", e),
            }
        }

        let due: Vec<ActiveMatch> = {
            let mut due = Vec::new();
            let mut i = 0;
            while i < self.active_matches.len() {
                if self.active_matches[i].started.elapsed() >= self.active_matches[i].lifetime {
                    due.push(self.active_matches.swap_remove(i));
                } else {
                    i += 1;
                }
            }
            due
        };

        let mut completed = 0usize;
        let mut crashed = 0usize;
        for active in due {
            let crash = rand::random::<f64>() < MATCH_CRASH_CHANCE;
            if crash {
                let message = {
                    let mut rng = rand::rng();
                    *CRASH_MESSAGES.choose(&mut rng).unwrap_or(&"Server timeout")
                };
                let request = CrashMatchRequest {
                    match_id: active.match_id,
                    error_message: message.to_string(),
                };
                match self.client.crash_match(&request).await {
                    Ok(_) => crashed += 1,
                    Err(e) => warn!("Failed to crash match {}: {}", active.match_id, e),
                }
            } else {
                let (winner_id, participant_stats) = {
                    let mut rng = rand::rng();
                    let winner_id = *active
                        .player_ids
                        .choose(&mut rng)
                        .unwrap_or(&active.player_ids[0]);
                    let stats = active
                        .player_ids
                        .iter()
                        .map(|player_id| ParticipantStat {
                            player_id: *player_id,
                            score: rng.random_range(100..=5000),
                            kills: rng.random_range(0..=20),
                            deaths: rng.random_range(0..=15),
                        })
                        .collect();
                    (winner_id, stats)
                };
                let request = CompleteMatchRequest {
                    match_id: active.match_id,
                    winner_id,
                    duration_seconds: active.started.elapsed().as_secs() as i64,
                    participant_stats,
                };
                match self.client.complete_match(&request).await {
                    Ok(_) => completed += 1,
                    Err(e) => warn!("Failed to complete match {}: {}", active.match_id, e),
                }
            }
        }

        info!(
            "Matches: {} started, {} completed, {} crashed ({} active)",
            started,
            completed,
            crashed,
            self.active_matches.len()
        );
        started + completed
    }

    async fn simulate_transactions(&self) -> usize {
        let player_ids = self.sample_players(self.cycle_count(BASE_TRANSACTIONS_PER_CYCLE));

        let mut success = 0usize;
        let mut revenue = 0.0f64;
        for player_id in &player_ids {
            let (item_type, item_name, amount) = {
                let mut rng = rand::rng();
                *STORE_ITEMS.choose(&mut rng).unwrap_or(&STORE_ITEMS[0])
            };
            let request = CreateTransactionRequest {
                player_id: *player_id,
                item_type: item_type.to_string(),
                item_name: item_name.to_string(),
                amount,
            };
            match self.client.create_transaction(&request).await {
                Ok(response) if response.status == "completed" => {
                    success += 1;
                    revenue += amount;
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to create transaction: {}", e),
            }
        }

        info!(
            "Transactions: {} successful, ${:.2} revenue",
            success, revenue
        );
        success
    }

    async fn inject_chaos(&self) {
        if rand::random::<f64>() >= CHAOS_CHANCE {
            return;
        }
        let (event_type, severity, message) = {
            let mut rng = rand::rng();
            *CHAOS_EVENTS.choose(&mut rng).unwrap_or(&CHAOS_EVENTS[0])
        };
        let request = LogEventRequest {
            event_type: event_type.to_string(),
            severity: severity.to_string(),
            message: message.to_string(),
            metadata: serde_json::json!({
                "timestamp": Local::now().to_rfc3339(),
                "source": "simulator",
            }),
        };
        match self.client.log_event(&request).await {
            Ok(_) => info!("Chaos injected: {}", message),
            Err(e) => warn!("Failed to log chaos event: {}", e),
        }
    }

    async fn api_is_healthy(&self) -> bool {
        match self.client.health().await {
            Ok(health) => health.status == "healthy",
            Err(_) => false,
        }
    }

    async fn log_current_stats(&self) {
        let players = self.client.player_stats().await;
        let matches = self.client.match_stats().await;
        let revenue = self.client.revenue_stats().await;
        if let (Ok(players), Ok(matches), Ok(revenue)) = (players, matches, revenue) {
            info!(
                "Stats: {} players ({} active now), {} matches in progress, {} completed today, ${:.2} revenue today",
                players.total_players,
                players.active_now,
                matches.in_progress,
                matches.completed_today,
                revenue.revenue_today
            );
        }
    }

    pub async fn run_cycle(&mut self) {
        info!("Cycle start (mode: {})", self.mode.as_str());

        if !self.api_is_healthy().await {
            warn!("API is not responding, skipping cycle");
            return;
        }

        let mut total_requests = 0usize;
        total_requests += self.simulate_logins().await;
        total_requests += self.simulate_matches().await;
        total_requests += self.simulate_transactions().await;
        self.inject_chaos().await;

        self.log_current_stats().await;
        info!("Cycle complete, {} API requests", total_requests);
    }

    pub async fn run(&mut self, interval: Duration) {
        info!("Waiting for the API to become ready");
        let mut retries = 0u32;
        while !self.api_is_healthy().await {
            retries += 1;
            if retries > READINESS_RETRIES {
                error!("API did not become ready, giving up");
                return;
            }
            tokio::time::sleep(READINESS_POLL_INTERVAL).await;
        }
        info!("API is ready");

        self.seed_initial_data().await;

        loop {
            self.run_cycle().await;
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_defaults_to_normal() {
        assert_eq!(SimulationMode::parse_lossy("slow"), SimulationMode::Slow);
        assert_eq!(
            SimulationMode::parse_lossy("tournament"),
            SimulationMode::Tournament
        );
        assert_eq!(SimulationMode::parse_lossy("bogus"), SimulationMode::Normal);
        assert_eq!(SimulationMode::parse_lossy(""), SimulationMode::Normal);
    }

    #[test]
    fn test_traffic_multiplier_shape() {
        assert_eq!(traffic_multiplier(20), 2.0);
        assert_eq!(traffic_multiplier(3), 0.3);
        assert_eq!(traffic_multiplier(13), 1.5);
        assert_eq!(traffic_multiplier(9), 1.0);
    }

    #[test]
    fn test_scaled_count_combines_multipliers() {
        assert_eq!(scaled_count(100.0, 2.0, 5.0), 1000);
        assert_eq!(scaled_count(20.0, 0.3, 1.0), 6);
        assert_eq!(scaled_count(10.0, 1.0, 0.5), 5);
    }
}
