//! History store.
//!
//! [`MessageStore`] defines the interface for the chat history log; the
//! implementation lives on [`AnyStore`], a sqlx `Any` pool so the SQLite
//! default can be swapped for another driver by changing the URL.
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required here.

pub mod dao;
pub mod message;

pub use dao::{Message, NewMessage, Role};
pub use message::MessageStore;

use std::str::FromStr;

use sqlx::any::{AnyConnectOptions, AnyPoolOptions};

#[derive(Clone, Debug)]
pub struct AnyStore {
    pool: sqlx::Pool<sqlx::Any>,
}

impl AnyStore {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible URL, e.g. `"sqlite://artifact.db?mode=rwc"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        Self::connect_with(url, 8).await
    }

    /// Like [`AnyStore::connect`] with an explicit pool size.
    ///
    /// In-memory SQLite databases are per-connection, so `"sqlite::memory:"`
    /// must be opened with `max_connections = 1`.
    pub async fn connect_with(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        sqlx::any::install_default_drivers();
        let options = AnyConnectOptions::from_str(url)?;
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Round-trip a trivial query to check the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect_with("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite store")
    }
}
