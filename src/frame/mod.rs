use std::fmt::{self, Display};

mod error;
pub use self::error::FrameError;

mod view;
pub use self::view::{FrameView, MIN_REQUEST_LEN};

pub type Address = u32;

pub type Bit = bool;

pub type Word = u16;

pub type Quantity = u16;

/// Command pair at request offsets 11-12, kept in the literal order the
/// upstream client puts the bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// (0x01, 0x04) — device read.
    Read,
    /// (0x01, 0x14) — device write.
    Write,
    /// Anything else. Answered with an empty success reply, never an
    /// error end-code, so a client waiting on a reply is not left hanging.
    Unknown(u8, u8),
}

impl Command {
    /// Classify the byte pair `(raw[11], raw[12])`.
    #[must_use]
    pub const fn new(lo: u8, hi: u8) -> Self {
        match (lo, hi) {
            (0x01, 0x04) => Self::Read,
            (0x01, 0x14) => Self::Write,
            (lo, hi) => Self::Unknown(lo, hi),
        }
    }

    /// Wire bytes, request order.
    #[must_use]
    pub const fn bytes(self) -> [u8; 2] {
        match self {
            Self::Read => [0x01, 0x04],
            Self::Write => [0x01, 0x14],
            Self::Unknown(lo, hi) => [lo, hi],
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Unknown(lo, hi) => write!(f, "unknown(0x{lo:02X} 0x{hi:02X})"),
        }
    }
}

/// Addressing mode selected by the low subcommand byte at offset 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// 0x00 — word access, one u16 per point.
    Word,
    /// 0x01 — bit access, two points per payload byte.
    Bit,
    /// Anything else; a no-op under read and write.
    Other(u8),
}

impl AccessMode {
    #[must_use]
    pub const fn new(sub_lo: u8) -> Self {
        match sub_lo {
            0x00 => Self::Word,
            0x01 => Self::Bit,
            other => Self::Other(other),
        }
    }

    /// Wire bytes of the subcommand pair.
    #[must_use]
    pub const fn bytes(self) -> [u8; 2] {
        match self {
            Self::Word => [0x00, 0x00],
            Self::Bit => [0x01, 0x00],
            Self::Other(sub) => [sub, 0x00],
        }
    }
}

impl Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word => write!(f, "word"),
            Self::Bit => write!(f, "bit"),
            Self::Other(sub) => write!(f, "subcommand 0x{sub:02X}"),
        }
    }
}

/// One decoded request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub mode: AccessMode,
    /// Memory-area code from offset 18; diagnostic only, never changes
    /// what gets synthesized. 0 when the frame stops short of it.
    pub device_code: u8,
    /// Requested point count from offsets 19-20. 0 when absent.
    pub points: Quantity,
}

/// Reply synthesized for one request. Nothing here survives past the
/// exchange that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Word read: one little-endian u16 per requested point.
    ReadWords(Vec<Word>),
    /// Bit read: nibble-packed bytes, two points per byte.
    ReadBits(Vec<u8>),
    /// Write acknowledgement. No payload; the data went nowhere.
    WriteAck(),
    /// Empty success for unknown commands and unrecognized subcommands.
    Empty(),
}

impl Response {
    /// Payload bytes this reply will occupy on the wire, excluding the
    /// envelope.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        match self {
            Self::ReadWords(words) => words.len() * 2,
            Self::ReadBits(bytes) => bytes.len(),
            Self::WriteAck() | Self::Empty() => 0,
        }
    }
}

/// Memory-area codes carried at request offset 18.
///
/// The server only ever logs these; the client half uses them to build
/// frames.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCode {
    /// Internal relay
    M = 0x90,
    /// Latch relay
    L = 0x92,
    /// Annunciator
    F = 0x93,
    /// Input relay
    X = 0x9C,
    /// Output relay
    Y = 0x9D,
    /// Link relay
    B = 0xA0,
    /// Data register
    D = 0xA8,
    /// File register
    R = 0xAF,
    /// Link register
    W = 0xB4,
}

impl DeviceCode {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x90 => Some(Self::M),
            0x92 => Some(Self::L),
            0x93 => Some(Self::F),
            0x9C => Some(Self::X),
            0x9D => Some(Self::Y),
            0xA0 => Some(Self::B),
            0xA8 => Some(Self::D),
            0xAF => Some(Self::R),
            0xB4 => Some(Self::W),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl Display for DeviceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::M => "M",
            Self::L => "L",
            Self::F => "F",
            Self::X => "X",
            Self::Y => "Y",
            Self::B => "B",
            Self::D => "D",
            Self::R => "R",
            Self::W => "W",
        };
        write!(f, "{label}")
    }
}
