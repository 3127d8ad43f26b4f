use byteorder::{ByteOrder, LittleEndian};

use super::{AccessMode, Command, FrameError, Quantity, Request};
use crate::header::REQUEST_SUBHEADER;

/// Shortest request frame the decoder accepts: subheader through the
/// subcommand pair.
pub const MIN_REQUEST_LEN: usize = 15;

const COMMAND_OFFSET: usize = 11;
const SUBCOMMAND_OFFSET: usize = 13;
const DEVICE_CODE_OFFSET: usize = 18;
const POINT_COUNT_OFFSET: usize = 19;

/// Typed view over one raw request frame.
///
/// Offsets follow the bytes the deployed client actually emits, which is
/// what the dashboard is tested against; they are not adjusted to match
/// the published protocol tables.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    raw: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Validate the minimum 3E shape. A frame that fails here gets no
    /// reply; the session just moves on to the next one.
    pub fn new(raw: &'a [u8]) -> Result<Self, FrameError> {
        if raw.len() < MIN_REQUEST_LEN {
            return Err(FrameError::TooShort(raw.len()));
        }
        if raw[0] != REQUEST_SUBHEADER {
            return Err(FrameError::BadSubheader(raw[0]));
        }
        Ok(Self { raw })
    }

    pub fn command(&self) -> Command {
        Command::new(self.raw[COMMAND_OFFSET], self.raw[COMMAND_OFFSET + 1])
    }

    pub fn mode(&self) -> AccessMode {
        AccessMode::new(self.raw[SUBCOMMAND_OFFSET])
    }

    /// Memory-area code, or 0 when the frame stops before offset 18.
    pub fn device_code(&self) -> u8 {
        self.raw.get(DEVICE_CODE_OFFSET).copied().unwrap_or(0)
    }

    /// Requested point count, or 0 when the frame stops before offset 20.
    pub fn point_count(&self) -> Quantity {
        if self.raw.len() > POINT_COUNT_OFFSET + 1 {
            LittleEndian::read_u16(&self.raw[POINT_COUNT_OFFSET..POINT_COUNT_OFFSET + 2])
        } else {
            0
        }
    }

    pub fn to_request(&self) -> Request {
        Request {
            command: self.command(),
            mode: self.mode(),
            device_code: self.device_code(),
            points: self.point_count(),
        }
    }
}
