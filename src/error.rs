//! Error types.

use thiserror::Error;

use crate::frame::FrameError;

/// Frame or transport errors surfaced by the client half.
///
/// The server half never reports these to the peer: malformed frames are
/// dropped and the session continues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Transport(#[from] std::io::Error),
    /// Non-zero end code in a reply. The emulator itself always answers
    /// with the success end code; this is reachable against real devices.
    #[error("device reported end code 0x{0:04X}")]
    Device(u16),
}
