use alloc::string::String;

use thiserror::Error;

/// Failure reported by a display device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("display unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read lookup tables: {0}")]
    Read(String),

    #[error("failed to write lookup tables: {0}")]
    Write(String),
}

/// Terminal outcome of a failed animation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The device session could not be opened
    #[error("session setup failed: {0}")]
    Setup(DeviceError),

    /// Lookup tables could not be read back or written
    #[error("lookup table access failed: {0}")]
    Read(DeviceError),

    /// Another process changed the lookup tables while the animation was running
    #[error("a foreign process updated the lookup tables")]
    ForeignUpdate,
}
