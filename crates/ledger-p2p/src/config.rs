use ledger_core::constants::{DEFAULT_PORT, HEAD_SYNC_FANOUT, MAXIMUM_CONNECTIONS};

/// Configuration for a node's peer network.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Local TCP listen port.
    pub listen_port: u16,
    /// Bootstrap peer hostnames, dialed transitively at start.
    pub seeds: Vec<String>,
    /// Soft cap on simultaneously active connections (§4.6).
    pub max_connections: usize,
    /// Number of random active peers queried for Head on bootstrap.
    pub head_sync_fanout: usize,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_PORT,
            seeds: Vec::new(),
            max_connections: MAXIMUM_CONNECTIONS,
            head_sync_fanout: HEAD_SYNC_FANOUT,
        }
    }
}
