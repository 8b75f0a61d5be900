use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::bb8::Pool;

use crate::config::AppConfig;

pub type DbPool = Pool<AsyncPgConnection>;

/// Shared per-request context. Built once at startup and cloned into every
/// handler, no process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub http_client: reqwest::Client,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: AppConfig) -> Self {
        Self {
            db_pool,
            http_client: reqwest::Client::new(),
            config,
        }
    }
}
