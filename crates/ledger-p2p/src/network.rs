//! The connection manager and message dispatcher (§4.6): bootstraps from
//! seeds, accepts inbound connections, answers protocol requests, and
//! gossips validated transactions to every peer but the one they arrived
//! from.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::net::{TcpListener, TcpStream};
use tokio::net::tcp::OwnedReadHalf;
use tracing::{debug, info, warn};

use ledger_core::TxHash;
use ledger_keystore::Keystore;
use ledger_store::Store;

use crate::config::P2pConfig;
use crate::connection::Connection;
use crate::error::P2pError;
use crate::message::{self, MessageType};
use crate::state::NetworkState;

/// Owns the listener, the seed-dialing bootstrap, and the per-connection
/// dispatch logic. Generic over the store so a node can run against
/// either [`ledger_store::SledStore`] or [`ledger_store::InMemoryStore`].
pub struct Network<S: Store + Send + Sync + 'static> {
    config: P2pConfig,
    state: Arc<NetworkState>,
    store: Arc<S>,
    keystore: Arc<Keystore>,
}

impl<S: Store + Send + Sync + 'static> Network<S> {
    pub fn spawn(config: P2pConfig, store: Arc<S>, keystore: Arc<Keystore>) -> Arc<Self> {
        let state = NetworkState::spawn(config.max_connections);
        Arc::new(Self { config, state, store, keystore })
    }

    /// Binds the listener, spawns the accept loop and seed bootstrap as
    /// background tasks, and returns the bound address (useful in tests,
    /// which bind port 0 and need to learn the OS-assigned port before
    /// dialing in).
    pub async fn start(self: &Arc<Self>) -> Result<std::net::SocketAddr, P2pError> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.listen_port)).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "listening for peers");

        let listener_net = self.clone();
        tokio::spawn(async move {
            if let Err(e) = listener_net.accept_loop(listener).await {
                warn!(error = %e, "listener task ended");
            }
        });

        let bootstrap_net = self.clone();
        tokio::spawn(async move { bootstrap_net.bootstrap().await });

        Ok(local_addr)
    }

    pub fn stop(&self) {
        self.state.request_stop();
        info!("stopped network");
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) -> Result<(), P2pError> {
        loop {
            if self.state.is_stopped() {
                return Ok(());
            }
            let (stream, addr) = listener.accept().await?;
            let host = addr.ip().to_string();
            let (read_half, write_half) = stream.into_split();
            let connection = Arc::new(Connection::new(host.clone(), write_half));
            self.state.notify_connected(host.clone(), connection.clone());
            info!(peer = %host, "saved connection");
            let net = self.clone();
            tokio::spawn(async move { net.run_read_loop(read_half, host, connection).await });
        }
    }

    /// Dials `seeds`, recording every peer each successful exchange
    /// offers and dialing those transitively, subject to the connection
    /// cap and the known-peers dedup. Finishes with a Head sync over a
    /// random sample of the resulting active connections.
    async fn bootstrap(self: &Arc<Self>) {
        let mut queue: VecDeque<String> = self.config.seeds.iter().cloned().collect();
        while let Some(host) = queue.pop_front() {
            if self.state.active_count().await >= self.state.max_connections {
                debug!(max = self.state.max_connections, "reached maximum number of connections");
                break;
            }
            if self.state.is_known(&host).await {
                continue;
            }
            match self.dial(&host).await {
                Ok(peers) => {
                    info!(peer = %host, "got new connection via seeds");
                    queue.extend(peers);
                }
                Err(e) => debug!(peer = %host, error = %e, "cannot connect to peer"),
            }
        }
        self.sync_head().await;
    }

    /// Opens a connection to `host`, performs the Connect handshake
    /// (write `{0, 0xFF}`, read one raw frame of comma-separated peers —
    /// this exchange happens before the connection is handed to the
    /// generic dispatcher), and spawns the read loop that will service
    /// whatever this peer sends afterward.
    async fn dial(self: &Arc<Self>, host: &str) -> Result<Vec<String>, P2pError> {
        let mut stream = TcpStream::connect((host, self.config.listen_port)).await?;
        message::write_frame(&mut stream, Some(MessageType::Connect), &[]).await?;
        let frame = message::read_frame(&mut stream).await?;
        let peers: Vec<String> = if frame.is_empty() {
            Vec::new()
        } else {
            String::from_utf8_lossy(&frame)
                .split(',')
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let (read_half, write_half) = stream.into_split();
        let connection = Arc::new(Connection::new(host.to_string(), write_half));
        self.state.notify_connected(host.to_string(), connection.clone());
        let net = self.clone();
        let host_owned = host.to_string();
        tokio::spawn(async move { net.run_read_loop(read_half, host_owned, connection).await });

        Ok(peers)
    }

    /// Queries Head on up to `head_sync_fanout` randomly chosen active
    /// connections. Only the maximum index each peer reports is surfaced
    /// (via the `HeadResponse` log line) — backfill from a stale local
    /// head is not implemented (§9 OQ4).
    async fn sync_head(self: &Arc<Self>) {
        let connections = self.state.active_connections().await;
        if connections.is_empty() {
            return;
        }
        let mut rng = rand::thread_rng();
        let sample: Vec<_> = connections
            .choose_multiple(&mut rng, self.config.head_sync_fanout.min(connections.len()))
            .cloned()
            .collect();
        for connection in sample {
            if let Err(e) = connection.write_frame(Some(MessageType::Head), &[]).await {
                debug!(peer = %connection.peer_addr, error = %e, "failed to request head");
            }
        }
    }

    /// Forwards `bytes` to every active connection except `origin`,
    /// counting successful writes (P8 — gossip never reflects to its
    /// source).
    async fn relay(&self, origin: Option<&str>, bytes: &[u8]) -> usize {
        let mut counter = 0;
        for connection in self.state.active_connections().await {
            if Some(connection.peer_addr.as_str()) == origin {
                debug!(peer = %connection.peer_addr, "skipping relaying to origin");
                continue;
            }
            if connection.write_frame(Some(MessageType::Relay), bytes).await.is_ok() {
                counter += 1;
            }
        }
        counter
    }

    async fn run_read_loop(self: Arc<Self>, mut read_half: OwnedReadHalf, addr: String, connection: Arc<Connection>) {
        loop {
            if self.state.is_stopped() {
                break;
            }
            match message::read_frame(&mut read_half).await {
                Ok(frame) => {
                    if let Err(e) = self.dispatch(&addr, &connection, &frame).await {
                        debug!(peer = %addr, error = %e, "dispatch error");
                    }
                }
                Err(e) => {
                    debug!(peer = %addr, error = %e, "error reading incoming connection");
                    break;
                }
            }
        }
        self.state.notify_closed(addr);
    }

    async fn dispatch(self: &Arc<Self>, from_addr: &str, connection: &Arc<Connection>, frame: &[u8]) -> Result<(), P2pError> {
        if frame.is_empty() {
            return Err(P2pError::ShortMessage);
        }
        let message_type = MessageType::try_from(frame[0])?;
        let payload = &frame[1..];

        match message_type {
            MessageType::Connect => {
                let peers = self.state.active_addrs_except(Some(from_addr)).await;
                debug!(count = peers.len(), "serving peers");
                connection.write_frame(None, peers.join(",").as_bytes()).await?;
            }

            MessageType::Head => {
                let last = self.store.get_last()?;
                let index = last.and_then(|tx| tx.index).unwrap_or(0);
                debug!(peer = %from_addr, "serving head");
                connection.write_frame(Some(MessageType::HeadResponse), &index.to_be_bytes()).await?;
            }

            MessageType::HeadResponse => {
                if payload.len() >= 8 {
                    let index = u64::from_be_bytes(payload[0..8].try_into().unwrap());
                    debug!(peer = %from_addr, index, "got head response");
                }
            }

            MessageType::Fetch => {
                if payload.len() < 32 {
                    connection.write_frame(None, b"Short message").await?;
                    return Ok(());
                }
                let hash = TxHash::from_bytes(&payload[0..32])?;
                match self.store.get(&hash)? {
                    Some(tx) => {
                        let bytes = ledger_core::encode(&tx);
                        connection.write_frame(Some(MessageType::FetchResponse), &bytes).await?;
                    }
                    None => {
                        connection.write_frame(None, b"No such transaction").await?;
                    }
                }
            }

            MessageType::FetchResponse => {
                if let Err(e) = ledger_processor::process(payload, &*self.store, &self.keystore) {
                    debug!(error = %e, "could not verify tx (fetch)");
                    connection.write_frame(None, b"Transaction rejected").await?;
                }
            }

            MessageType::Relay => {
                let hash = match ledger_core::decode(payload) {
                    Ok(tx) => tx.hash,
                    Err(e) => {
                        debug!(error = %e, "could not decode relayed transaction");
                        connection.write_frame(None, b"Transaction rejected").await?;
                        return Ok(());
                    }
                };
                let already_seen = self.state.seen.lock().await.check_and_insert(hash);

                match ledger_processor::process(payload, &*self.store, &self.keystore) {
                    Ok((tx, _check)) => {
                        if !already_seen {
                            let relayed = self.relay(Some(from_addr), payload).await;
                            info!(hash = %tx.hash, relayed, "relayed transaction");
                        }
                        connection.write_frame(Some(MessageType::RelayResponse), tx.hash.as_bytes()).await?;
                    }
                    Err(e) => {
                        debug!(error = %e, "could not verify tx (relay)");
                        connection.write_frame(None, b"Transaction rejected").await?;
                    }
                }
            }

            MessageType::RelayResponse => {
                debug!(peer = %from_addr, bytes = payload.len(), "got relay response hash");
            }

            MessageType::Compute | MessageType::ComputeResponse => {
                debug!("compute messages are out of scope, ignoring");
            }

            MessageType::ConnectResponse => {
                // Reserved; the wire protocol never actually emits this tag.
            }
        }

        Ok(())
    }
}
