use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;

use crate::ServiceResult;

pub type EventId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Unknown severities are preserved as info rather than rejected; the
    /// original system accepts arbitrary severity strings.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            "critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

/// Append-only log entry; never mutated or deleted by the core.
#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub id: EventId,
    pub event_type: String,
    pub severity: Severity,
    pub message: String,
    pub metadata: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewSystemEvent {
    pub event_type: String,
    pub severity: Severity,
    pub message: String,
    pub metadata: Option<String>,
}

pub type ArcEventRepository = Arc<Box<dyn EventRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait EventRepository {
    async fn create_event(
        &self,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<SystemEvent>;
}

pub type ArcEventService = Arc<Box<dyn EventService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait EventService {
    async fn log_event(&self, event: NewSystemEvent) -> ServiceResult<SystemEvent>;
}

pub struct EventServiceImpl {
    event_repository: ArcEventRepository,
}

impl EventServiceImpl {
    pub fn new(event_repository: ArcEventRepository) -> Self {
        Self { event_repository }
    }
}

#[async_trait::async_trait]
impl EventService for EventServiceImpl {
    async fn log_event(&self, event: NewSystemEvent) -> ServiceResult<SystemEvent> {
        let created = self.event_repository.create_event(&event, Utc::now()).await?;
        if matches!(created.severity, Severity::Error | Severity::Critical) {
            warn!(
                "System event {} ({}): {}",
                created.event_type,
                created.severity.as_str(),
                created.message
            );
        }
        Ok(created)
    }
}
