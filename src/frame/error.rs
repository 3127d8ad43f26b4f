use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame of {0} bytes is shorter than the 15 byte minimum")]
    TooShort(usize),
    #[error("frame does not start with the 0x50 request subheader (got 0x{0:02X})")]
    BadSubheader(u8),
    #[error("reply frame does not carry the fixed reply prefix")]
    BadReplyPrefix,
    #[error("reply frame is shorter than its declared payload")]
    Truncated,
}
