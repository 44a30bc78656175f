use std::sync::Arc;

use crate::ServiceResult;

pub type ArcDatabaseHealth = Arc<Box<dyn DatabaseHealth + Send + Sync + 'static>>;

/// Connectivity probe for the health endpoint.
#[async_trait::async_trait]
pub trait DatabaseHealth {
    async fn ping(&self) -> ServiceResult<()>;
}

#[derive(Default, Clone)]
pub struct AlwaysHealthy;

#[async_trait::async_trait]
impl DatabaseHealth for AlwaysHealthy {
    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}
