// Buffer error types
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BufferError {
    /// The buffer is full and already at its maximum capacity.
    #[error("buffer capacity exceeded (max: {max} points)")]
    CapacityExceeded { max: usize },

    #[error("index {index} out of bounds for {len} points")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("domain value {0} is not finite")]
    NonFiniteDomain(f64),

    /// Inserting at this index would break strictly increasing domain order.
    #[error("run of {len} points at index {index} breaks domain ordering")]
    OutOfOrder { index: usize, len: usize },
}

pub type BufferResult<T> = Result<T, BufferError>;
