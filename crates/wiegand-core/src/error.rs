use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Parity is only defined for non-empty, even-length frames.
    #[error("Invalid frame length for parity check: {len} bits")]
    InvalidFrameLength { len: usize },

    #[error("Invalid bit value: {0}")]
    InvalidBit(u8),

    #[error("Invalid line identifier: {0}")]
    InvalidLineId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
