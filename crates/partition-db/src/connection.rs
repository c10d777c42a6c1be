//! Opening the partition store.
//!
//! The server talks to a remote SurrealDB over WebSocket. Opening the
//! store signs in, selects the namespace and brings the schema up to
//! date, so a [`DbManager`] is always ready for the repositories.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

/// Where the partition store lives and how to sign in.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "partition".into(),
            database: "service".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Reject settings that could only fail once connected.
    pub fn validate(&self) -> Result<(), DbError> {
        let required = [
            ("url", &self.url),
            ("namespace", &self.namespace),
            ("database", &self.database),
            ("username", &self.username),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(DbError::Connect {
                url: self.url.clone(),
                reason: format!("{name} must not be empty"),
            }),
            None => Ok(()),
        }
    }
}

/// A signed-in, migrated connection to the partition store.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect, sign in as root, select the namespace and database, then
    /// apply pending migrations.
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        config.validate()?;
        let connect_err = |e: surrealdb::Error| DbError::Connect {
            url: config.url.clone(),
            reason: e.to_string(),
        };

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening partition store"
        );

        let db = Surreal::new::<Ws>(&config.url).await.map_err(connect_err)?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await
        .map_err(connect_err)?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(connect_err)?;

        run_migrations(&db).await?;
        info!(namespace = %config.namespace, "Partition store ready");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
