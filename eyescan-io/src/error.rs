use std::io;

/// Failure taxonomy for the scan stack.
///
/// Configuration problems are caught before any transaction is issued.
/// Transport and protocol failures abort the sweep immediately: the
/// wrapper's shadow registers make a retried shift unsafe, so nothing
/// here is ever retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Chain position outside `[1, count]`.
    #[error("device position {device} outside chain of {count}")]
    InvalidChainPosition { device: usize, count: usize },

    /// Test pattern name the receiver does not implement.
    #[error("unrecognized test pattern {0:?}")]
    UnknownTestPattern(String),

    /// Underlying channel or engine I/O failure.
    #[error("transport: {0}")]
    Transport(#[from] io::Error),

    /// Captured reply too short to contain every expected field.
    #[error("captured reply of {got} bits, {need} required")]
    ShortReply { got: usize, need: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
