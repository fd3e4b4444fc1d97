//! Push-based catalog change notifications.
//!
//! Database triggers on `services`, `categories` and `items` send the table
//! name on the [`CHANGE_CHANNEL`] channel. The subscription task re-fetches
//! that table for each notification.

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CatalogError, CatalogTable, Inner};

/// `LISTEN/NOTIFY` channel carrying catalog table names.
pub const CHANGE_CHANNEL: &str = "catalog_changes";

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// A single change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// One table changed.
    Table(CatalogTable),
    /// Notifications may have been missed; refetch everything.
    Resync,
}

/// Opens change streams.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn ChangeStream>, CatalogError>;
}

/// An open stream of change events.
#[async_trait]
pub trait ChangeStream: Send {
    /// Wait for the next event. `None` means the stream is closed for good.
    async fn next_change(&mut self) -> Option<ChangeEvent>;
}

/// Owns the subscription task and aborts it on drop.
#[derive(Debug)]
pub struct SubscriptionHandle(JoinHandle<()>);

impl SubscriptionHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawn the task that applies change events to the store.
///
/// The task only holds a weak reference and stops as soon as the store is gone.
pub(super) fn spawn(store: Weak<Inner>, mut stream: Box<dyn ChangeStream>) -> SubscriptionHandle {
    SubscriptionHandle(tokio::spawn(async move {
        while let Some(event) = stream.next_change().await {
            let Some(inner) = store.upgrade() else {
                break;
            };

            let result = match event {
                ChangeEvent::Table(table) => {
                    debug!(table = table.as_str(), "Catalog table changed");
                    inner.refresh_table(table).await
                }
                ChangeEvent::Resync => {
                    info!("Resyncing full catalog");
                    inner.refresh_all().await
                }
            };

            if let Err(e) = result {
                warn!(error = %e, ?event, "Catalog refresh failed");
            }
        }
        debug!("Catalog change stream closed");
    }))
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// [`ChangeFeed`] backed by `PostgreSQL` `LISTEN/NOTIFY`.
#[derive(Clone)]
pub struct PgChangeFeed {
    pool: PgPool,
}

impl PgChangeFeed {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self) -> Result<Box<dyn ChangeStream>, CatalogError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        Ok(Box::new(PgChangeStream { listener }))
    }
}

struct PgChangeStream {
    listener: PgListener,
}

impl PgChangeStream {
    /// Block until the listener has a live connection again.
    ///
    /// Running any statement through the listener reconnects it and re-issues
    /// `LISTEN` for every channel.
    async fn reconnect(&mut self) {
        loop {
            match sqlx::query("SELECT 1").execute(&mut self.listener).await {
                Ok(_) => return,
                Err(e) => {
                    warn!(error = %e, "Catalog listener reconnect failed");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}

#[async_trait]
impl ChangeStream for PgChangeStream {
    async fn next_change(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.listener.try_recv().await {
                Ok(Some(notification)) => match notification.payload().parse() {
                    Ok(table) => return Some(ChangeEvent::Table(table)),
                    Err(e) => warn!(error = %e, "Ignoring catalog notification"),
                },
                Ok(None) => {
                    warn!("Catalog listener connection lost");
                    self.reconnect().await;
                    return Some(ChangeEvent::Resync);
                }
                Err(e) => {
                    warn!(error = %e, "Catalog listener error");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}
