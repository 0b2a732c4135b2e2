use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::connection::Connection;
use crate::seen::SeenCache;

const SEEN_CACHE_CAPACITY: usize = 4096;

/// One mutation request for the connection manager task. Per the design
/// notes' re-architecture guidance, connection-list mutations are confined
/// to a single task reading this channel — connection read/accept loops
/// only ever send events, they never touch the maps directly.
pub enum ConnectionEvent {
    Connected { addr: String, connection: Arc<Connection> },
    Closed { addr: String },
}

/// Shared network state: the active connection pool, the known-peer set
/// accumulated from every Connect exchange, the soft connection cap, and
/// the dedup cache the relay path consults before re-broadcasting.
pub struct NetworkState {
    active: Mutex<HashMap<String, Arc<Connection>>>,
    known_peers: Mutex<HashSet<String>>,
    stop: AtomicBool,
    pub seen: Mutex<SeenCache>,
    pub max_connections: usize,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl NetworkState {
    /// Builds the shared state and spawns the manager task that owns all
    /// mutation of the active-connection map. Returns the `Arc` other
    /// tasks hold for reads (`active_count`, `is_known`, `active_addrs`)
    /// and for sending events (`notify_connected` / `notify_closed`).
    pub fn spawn(max_connections: usize) -> Arc<Self> {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            active: Mutex::new(HashMap::new()),
            known_peers: Mutex::new(HashSet::new()),
            stop: AtomicBool::new(false),
            seen: Mutex::new(SeenCache::new(SEEN_CACHE_CAPACITY)),
            max_connections,
            events_tx,
        });

        let manager_state = state.clone();
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                match event {
                    ConnectionEvent::Connected { addr, connection } => {
                        manager_state.active.lock().await.insert(addr.clone(), connection);
                        manager_state.known_peers.lock().await.insert(addr.clone());
                        debug!(peer = %addr, "saved connection");
                    }
                    ConnectionEvent::Closed { addr } => {
                        manager_state.active.lock().await.remove(&addr);
                        debug!(peer = %addr, "removed connection");
                    }
                }
            }
        });

        state
    }

    pub fn notify_connected(&self, addr: String, connection: Arc<Connection>) {
        let _ = self.events_tx.send(ConnectionEvent::Connected { addr, connection });
    }

    pub fn notify_closed(&self, addr: String) {
        let _ = self.events_tx.send(ConnectionEvent::Closed { addr });
    }

    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_known(&self, addr: &str) -> bool {
        self.known_peers.lock().await.contains(addr)
    }

    pub async fn active_connections(&self) -> Vec<Arc<Connection>> {
        self.active.lock().await.values().cloned().collect()
    }

    pub async fn active_addrs_except(&self, except: Option<&str>) -> Vec<String> {
        self.active
            .lock()
            .await
            .keys()
            .filter(|addr| Some(addr.as_str()) != except)
            .cloned()
            .collect()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
