use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::grade_aggregator::RoundingPolicy;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    rounding: RoundingPolicy,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, redis: RedisHandle) -> Self {
        let rounding = RoundingPolicy::from_settings(settings.grading());
        Self { inner: Arc::new(InnerState { settings, db, redis, rounding }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    /// The single rounding policy every grade view uses.
    pub(crate) fn rounding(&self) -> RoundingPolicy {
        self.inner.rounding
    }
}
