use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::TokenIssuer;
use crate::config::{AppConfig, StoreBackend};
use crate::storage::{self, StorageClient};
use crate::users::{AccountService, MemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres store")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserStore::new(db))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; accounts are lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };

        let storage: Arc<dyn StorageClient> = storage::from_config(&config.storage)
            .await
            .context("init image storage")?
            .into();
        tracing::info!(store = ?config.store, storage = config.storage.backend(), "state ready");

        Ok(Self::from_parts(config, store, storage))
    }

    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn UserStore>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt);
        Self {
            accounts: Arc::new(AccountService::new(store, tokens)),
            storage,
        }
    }
}
