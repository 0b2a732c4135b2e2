use thiserror::Error;

#[derive(Debug, Error)]
pub enum P2pError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown message type byte: {0}")]
    UnknownMessageType(u8),

    #[error("message too short for its type")]
    ShortMessage,

    #[error("processor error: {0}")]
    Processor(#[from] ledger_processor::ProcessorError),

    #[error("store error: {0}")]
    Store(#[from] ledger_store::StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] ledger_core::CoreError),

    #[error("peer connection closed")]
    PeerClosed,
}
