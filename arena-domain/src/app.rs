use std::sync::Arc;

use crate::{
    event::{ArcEventRepository, ArcEventService, EventServiceImpl},
    health::ArcDatabaseHealth,
    matches::{ArcMatchRepository, ArcMatchService, MatchServiceImpl},
    metrics::ArcMetricsSink,
    player::{ArcPlayerRepository, ArcPlayerService, PlayerServiceImpl},
    stats::{ArcStatsService, StatsServiceImpl},
    transaction::{ArcTransactionRepository, ArcTransactionService, TransactionServiceImpl},
};

#[derive(Clone)]
pub struct AppState {
    pub player_service: ArcPlayerService,
    pub match_service: ArcMatchService,
    pub transaction_service: ArcTransactionService,
    pub event_service: ArcEventService,
    pub stats_service: ArcStatsService,
    pub database_health: ArcDatabaseHealth,
}

pub fn construct_app(
    player_repository: ArcPlayerRepository,
    match_repository: ArcMatchRepository,
    transaction_repository: ArcTransactionRepository,
    event_repository: ArcEventRepository,
    database_health: ArcDatabaseHealth,
    metrics: ArcMetricsSink,
) -> AppState {
    let player_service: ArcPlayerService = Arc::new(Box::new(PlayerServiceImpl::new(
        player_repository.clone(),
        metrics.clone(),
    )));

    let match_service: ArcMatchService = Arc::new(Box::new(MatchServiceImpl::new(
        match_repository.clone(),
        player_repository.clone(),
        metrics.clone(),
    )));

    let transaction_service: ArcTransactionService = Arc::new(Box::new(
        TransactionServiceImpl::new(transaction_repository.clone(), player_repository.clone(), metrics),
    ));

    let event_service: ArcEventService =
        Arc::new(Box::new(EventServiceImpl::new(event_repository)));

    let stats_service: ArcStatsService = Arc::new(Box::new(StatsServiceImpl::new(
        player_repository,
        match_repository,
        transaction_repository,
    )));

    AppState {
        player_service,
        match_service,
        transaction_service,
        event_service,
        stats_service,
        database_health,
    }
}
