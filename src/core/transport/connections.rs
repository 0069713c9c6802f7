//! Connection tracking for the HTTP-streaming transport.
//!
//! Clients register through `/connect` or an `initialize` call and keep
//! their connection alive with heartbeats. A background sweep counts missed
//! heartbeats and drops connections that stay silent too long.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::rpc::is_supported_protocol_version;

/// Errors from connection bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(String),

    #[error("Connection not found: {0}")]
    NotFound(String),
}

/// Lifecycle state of a tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Disconnected,
    Error,
}

/// A tracked client connection.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub id: String,
    pub state: ConnectionState,
    pub created_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    pub protocol_version: String,
    pub client_info: serde_json::Value,
    pub error_count: u32,
}

/// Aggregate view returned by [`ConnectionManager::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub active_connections: usize,
    pub protocol_versions: Vec<String>,
}

struct Inner {
    connections: RwLock<HashMap<String, ConnectionInfo>>,
    heartbeat_interval: Duration,
    max_error_count: u32,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// Shared handle to the connection table.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager. Nothing is swept until [`start`](Self::start).
    pub fn new(heartbeat_interval: Duration, max_error_count: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                connections: RwLock::new(HashMap::new()),
                heartbeat_interval,
                max_error_count: max_error_count.max(1),
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Spawn the background sweep. Calling it twice is a no-op.
    pub async fn start(&self) {
        let mut sweeper = self.inner.sweeper.lock().await;
        if sweeper.is_some() {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.heartbeat_interval;
        *sweeper = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                ConnectionManager { inner }.sweep_at(Utc::now()).await;
            }
        }));
        info!(
            interval_secs = period.as_secs(),
            max_error_count = self.inner.max_error_count,
            "Connection manager started"
        );
    }

    /// Abort the sweep and drop every connection.
    pub async fn stop(&self) {
        if let Some(handle) = self.inner.sweeper.lock().await.take() {
            handle.abort();
        }
        let mut connections = self.inner.connections.write().await;
        let count = connections.len();
        connections.clear();
        info!(dropped = count, "Connection manager stopped");
    }

    /// Register a new connection under a fresh id.
    pub async fn connect(
        &self,
        protocol_version: &str,
        client_info: serde_json::Value,
    ) -> Result<ConnectionInfo, ConnectionError> {
        self.connect_with_id(uuid::Uuid::new_v4().to_string(), protocol_version, client_info)
            .await
    }

    /// Register a connection under a caller-chosen id, replacing any
    /// existing entry with that id.
    pub async fn connect_with_id(
        &self,
        id: String,
        protocol_version: &str,
        client_info: serde_json::Value,
    ) -> Result<ConnectionInfo, ConnectionError> {
        if !is_supported_protocol_version(protocol_version) {
            warn!("Rejected connection with protocol version {}", protocol_version);
            return Err(ConnectionError::UnsupportedProtocolVersion(
                protocol_version.to_string(),
            ));
        }

        let now = Utc::now();
        let connection = ConnectionInfo {
            id: id.clone(),
            state: ConnectionState::Connected,
            created_at: now,
            last_heartbeat: now,
            protocol_version: protocol_version.to_string(),
            client_info,
            error_count: 0,
        };

        self.inner
            .connections
            .write()
            .await
            .insert(id.clone(), connection.clone());
        info!(connection = %id, protocol_version, "Connection established");
        Ok(connection)
    }

    /// Remove a connection. Returns whether it existed.
    pub async fn disconnect(&self, id: &str) -> bool {
        let removed = self.inner.connections.write().await.remove(id).is_some();
        if removed {
            info!(connection = %id, "Connection closed");
        }
        removed
    }

    /// Record a heartbeat and reset the connection's error count.
    pub async fn heartbeat(&self, id: &str) -> Result<DateTime<Utc>, ConnectionError> {
        let mut connections = self.inner.connections.write().await;
        let connection = connections
            .get_mut(id)
            .ok_or_else(|| ConnectionError::NotFound(id.to_string()))?;

        let now = Utc::now();
        connection.last_heartbeat = now;
        connection.error_count = 0;
        debug!(connection = %id, "Heartbeat");
        Ok(now)
    }

    /// Look up a connection by id.
    pub async fn get(&self, id: &str) -> Option<ConnectionInfo> {
        self.inner.connections.read().await.get(id).cloned()
    }

    /// Connected clients, oldest first.
    pub async fn active_connections(&self) -> Vec<ConnectionInfo> {
        let mut active: Vec<ConnectionInfo> = self
            .inner
            .connections
            .read()
            .await
            .values()
            .filter(|c| c.state == ConnectionState::Connected)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        active
    }

    /// Counts and the protocol versions in use.
    pub async fn stats(&self) -> ConnectionStats {
        let connections = self.inner.connections.read().await;
        let versions: BTreeSet<String> = connections
            .values()
            .map(|c| c.protocol_version.clone())
            .collect();

        ConnectionStats {
            total_connections: connections.len(),
            active_connections: connections
                .values()
                .filter(|c| c.state == ConnectionState::Connected)
                .count(),
            protocol_versions: versions.into_iter().collect(),
        }
    }

    /// Run one sweep as of `now`. Returns the ids that were dropped.
    ///
    /// A connection silent for more than twice the heartbeat interval gains
    /// an error; at `max_error_count` errors it is removed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Vec<String> {
        let idle_limit_ms = i64::try_from(self.inner.heartbeat_interval.as_millis() * 2)
            .unwrap_or(i64::MAX);
        let mut connections = self.inner.connections.write().await;
        let mut expired = Vec::new();

        for (id, connection) in connections.iter_mut() {
            if connection.state != ConnectionState::Connected {
                continue;
            }
            let idle_ms = (now - connection.last_heartbeat).num_milliseconds();
            if idle_ms > idle_limit_ms {
                connection.error_count += 1;
                warn!(
                    connection = %id,
                    error_count = connection.error_count,
                    "Connection heartbeat overdue"
                );
                if connection.error_count >= self.inner.max_error_count {
                    connection.state = ConnectionState::Error;
                    expired.push(id.clone());
                }
            }
        }

        for id in &expired {
            if let Some(mut connection) = connections.remove(id) {
                connection.state = ConnectionState::Disconnected;
                info!(connection = %connection.id, "Connection dropped after missed heartbeats");
            }
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> ConnectionManager {
        ConnectionManager::new(Duration::from_secs(30), 3)
    }

    #[tokio::test]
    async fn test_connect_and_stats() {
        let manager = manager();
        manager.connect("2025-06-18", json!({ "name": "a" })).await.unwrap();
        manager.connect("2024-11-05", json!({})).await.unwrap();
        manager.connect("2025-06-18", json!({})).await.unwrap();

        let stats = manager.stats().await;
        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.active_connections, 3);
        assert_eq!(stats.protocol_versions, vec!["2024-11-05", "2025-06-18"]);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_version() {
        let err = manager().connect("2.1", json!({})).await.unwrap_err();
        assert_eq!(err, ConnectionError::UnsupportedProtocolVersion("2.1".to_string()));
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_connection() {
        let err = manager().heartbeat("missing").await.unwrap_err();
        assert_eq!(err, ConnectionError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_drops_after_max_errors() {
        let manager = manager();
        let conn = manager.connect("2025-06-18", json!({})).await.unwrap();
        let late = Utc::now() + chrono::Duration::seconds(61);

        assert!(manager.sweep_at(late).await.is_empty());
        assert!(manager.sweep_at(late).await.is_empty());
        assert_eq!(manager.get(&conn.id).await.unwrap().error_count, 2);

        assert_eq!(manager.sweep_at(late).await, vec![conn.id.clone()]);
        assert!(manager.get(&conn.id).await.is_none());
    }

    #[tokio::test]
    async fn test_heartbeat_resets_error_count() {
        let manager = manager();
        let conn = manager.connect("2025-06-18", json!({})).await.unwrap();
        let late = Utc::now() + chrono::Duration::seconds(61);

        manager.sweep_at(late).await;
        assert_eq!(manager.get(&conn.id).await.unwrap().error_count, 1);

        manager.heartbeat(&conn.id).await.unwrap();
        assert_eq!(manager.get(&conn.id).await.unwrap().error_count, 0);
    }

    #[tokio::test]
    async fn test_fresh_connection_survives_sweep() {
        let manager = manager();
        let conn = manager.connect("2025-06-18", json!({})).await.unwrap();
        assert!(manager.sweep_at(Utc::now()).await.is_empty());
        assert_eq!(manager.get(&conn.id).await.unwrap().error_count, 0);
    }

    #[tokio::test]
    async fn test_stop_clears_connections() {
        let manager = manager();
        manager.start().await;
        manager.start().await;
        manager.connect("2025-06-18", json!({})).await.unwrap();

        manager.stop().await;
        assert_eq!(manager.stats().await.total_connections, 0);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let manager = manager();
        let conn = manager.connect("2025-03-26", json!({})).await.unwrap();
        assert!(manager.disconnect(&conn.id).await);
        assert!(!manager.disconnect(&conn.id).await);
        assert!(manager.active_connections().await.is_empty());
    }
}
