//! Ring Buffer
//!
//! Fixed-capacity trailing window over a single sensor channel, used for
//! per-device rolling statistics.

mod buffer;

pub use buffer::RollingWindow;

use thiserror::Error;

/// Ring buffer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("Window capacity must be at least 1")]
    ZeroCapacity,
}
