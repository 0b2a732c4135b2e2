use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::error::P2pError;
use crate::message::{self, MessageType};

/// One peer connection's write side. The read side is owned exclusively by
/// the task running that connection's read loop and is never shared, so
/// only writes (responses, relay fan-out) need synchronization.
pub struct Connection {
    pub peer_addr: String,
    write_half: Mutex<OwnedWriteHalf>,
}

impl Connection {
    pub fn new(peer_addr: String, write_half: OwnedWriteHalf) -> Self {
        Self {
            peer_addr,
            write_half: Mutex::new(write_half),
        }
    }

    pub async fn write_frame(&self, type_byte: Option<MessageType>, payload: &[u8]) -> Result<(), P2pError> {
        let mut guard = self.write_half.lock().await;
        message::write_frame(&mut *guard, type_byte, payload).await
    }
}
