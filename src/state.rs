use crate::auth::token::TokenKeys;
use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, TodoStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: TokenKeys,
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        match config.database_url.clone() {
            Some(url) => {
                let store = PgStore::connect(&url).await?;
                store.migrate().await?;
                tracing::info!("using postgres store");
                Ok(Self::from_parts(config, Arc::new(store)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; data will not survive a restart");
                Ok(Self::from_parts(config, Arc::new(MemoryStore::new())))
            }
        }
    }

    pub fn from_parts<S>(config: AppConfig, store: Arc<S>) -> Self
    where
        S: UserStore + TodoStore + 'static,
    {
        Self {
            keys: TokenKeys::new(&config.jwt),
            config: Arc::new(config),
            users: store.clone(),
            todos: store,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
        };
        Self::from_parts(config, Arc::new(MemoryStore::new()))
    }
}
