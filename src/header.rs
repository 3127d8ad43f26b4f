use bytes::{BufMut, Bytes, BytesMut};

pub type HeaderBytes = Bytes;

/// First byte of every binary 3E request frame.
pub(crate) const REQUEST_SUBHEADER: u8 = 0x50;

/// Fixed 7-byte prefix of every reply frame:
/// subheader D0 00, network 00, PLC FF, module IO FF 03, station 00.
pub(crate) const RESPONSE_PREFIX: [u8; 7] = [0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00];

/// End code reported in every reply. The emulator always succeeds.
pub(crate) const END_CODE_SUCCESS: u16 = 0x0000;

/// Fixed prefix of request frames, used by the client half when
/// constructing frames.
pub(crate) struct RequestHeader(pub HeaderBytes);

impl RequestHeader {
    pub fn new() -> Self {
        let mut buf = BytesMut::new();
        buf.put_u8(REQUEST_SUBHEADER);
        buf.put_u8(0x00);
        buf.put_u8(0x00); // network no.
        buf.put_u8(0xFF); // PLC no.
        buf.put_u16_le(0x03FF); // module IO no.
        buf.put_u8(0x00); // station no.
        RequestHeader(buf.freeze())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Fixed prefix of reply frames. The length and end-code fields that
/// follow it on the wire are written by the encoder.
pub(crate) struct ResponseHeader(pub HeaderBytes);

impl ResponseHeader {
    pub fn new() -> Self {
        ResponseHeader(Bytes::from_static(&RESPONSE_PREFIX))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
