use std::sync::Arc;

use anyhow::Context;

use habitlog_auth::{Hs256Jwt, PasswordHasher};
use habitlog_core::{Clock, SystemClock};
use habitlog_infra::{
    config::AppConfig,
    db,
    images::{ImageHost, ImgbbClient},
    store::{InMemoryStore, PostgresStore, Store},
};

/// Shared dependencies handed to every handler via `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub images: Arc<dyn ImageHost>,
    pub tokens: Arc<Hs256Jwt>,
    pub hasher: PasswordHasher,
    pub clock: Arc<dyn Clock>,
}

/// Wire production services from configuration.
///
/// Without a database URL the process runs against [`InMemoryStore`].
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.db_max_connections)
                .await
                .context("connecting to postgres")?;
            db::migrate(&pool).await.context("applying schema")?;
            tracing::info!(max_connections = config.db_max_connections, "using postgres store");
            Arc::new(PostgresStore::new(pool))
        }
        None => {
            tracing::warn!("using in-memory store; data is lost on restart");
            InMemoryStore::arc()
        }
    };

    let images = Arc::new(
        ImgbbClient::new(config.imgbb_key.clone(), config.imgbb_expiration)
            .context("building imgbb client")?,
    );
    let ttl = chrono::TimeDelta::try_hours(config.jwt_ttl_hours)
        .filter(|ttl| *ttl > chrono::TimeDelta::zero())
        .context("JWT_TTL_HOURS out of range")?;
    let tokens = Arc::new(Hs256Jwt::with_ttl(config.jwt_secret.as_bytes(), ttl));
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("BCRYPT_COST")?;

    Ok(AppServices {
        store,
        images,
        tokens,
        hasher,
        clock: Arc::new(SystemClock),
    })
}
