pub mod tcp;

use std::fmt::Debug;

use async_trait::async_trait;
use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    codec::{bits_to_bytes, bytes_to_bits},
    error::Error,
    frame::{AccessMode, Address, Bit, Command, DeviceCode, FrameError, Quantity, Word},
    header::{RequestHeader, RESPONSE_PREFIX},
};

/// Offset of the request-length field inside a request frame; the value
/// counts every byte that follows it and the timer field.
const REQUEST_LEN_OFFSET: usize = 7;

/// Reply payload starts after prefix, length, and end code.
const REPLY_PAYLOAD_OFFSET: usize = 11;

/// One request/reply exchange over some transport.
#[async_trait]
pub trait Client: Send + Debug {
    /// Send one request frame and return the raw reply frame.
    async fn call(&mut self, request: Bytes) -> Result<Bytes, Error>;
}

/// Typed operations over a [`Client`] transport.
///
/// This is the harness side of the emulator: integration tests and
/// probe tools drive the served device through it.
#[derive(Debug)]
pub struct Context<T: Client> {
    client: T,
}

impl<T: Client> Context<T> {
    pub fn new(client: T) -> Self {
        Self { client }
    }

    pub async fn read_words(
        &mut self,
        device: DeviceCode,
        addr: Address,
        cnt: Quantity,
    ) -> Result<Vec<Word>, Error> {
        let request = build_request(Command::Read, AccessMode::Word, device, addr, cnt, &[]);
        let reply = self.client.call(request).await?;
        let payload = check_reply(&reply)?;

        if payload.len() < cnt as usize * 2 {
            return Err(FrameError::Truncated.into());
        }
        Ok(payload[..cnt as usize * 2]
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect())
    }

    pub async fn read_bits(
        &mut self,
        device: DeviceCode,
        addr: Address,
        cnt: Quantity,
    ) -> Result<Vec<Bit>, Error> {
        let request = build_request(Command::Read, AccessMode::Bit, device, addr, cnt, &[]);
        let reply = self.client.call(request).await?;
        let payload = check_reply(&reply)?;

        if payload.len() < (cnt as usize + 1) / 2 {
            return Err(FrameError::Truncated.into());
        }
        Ok(bytes_to_bits(payload, cnt as usize))
    }

    pub async fn write_words(
        &mut self,
        device: DeviceCode,
        addr: Address,
        words: &[Word],
    ) -> Result<(), Error> {
        let mut data = Vec::with_capacity(words.len() * 2);
        for &word in words {
            data.extend_from_slice(&word.to_le_bytes());
        }
        let request = build_request(
            Command::Write,
            AccessMode::Word,
            device,
            addr,
            words.len() as Quantity,
            &data,
        );
        let reply = self.client.call(request).await?;
        check_reply(&reply).map(|_| ())
    }

    pub async fn write_bits(
        &mut self,
        device: DeviceCode,
        addr: Address,
        bits: &[Bit],
    ) -> Result<(), Error> {
        let data = bits_to_bytes(bits);
        let request = build_request(
            Command::Write,
            AccessMode::Bit,
            device,
            addr,
            bits.len() as Quantity,
            &data,
        );
        let reply = self.client.call(request).await?;
        check_reply(&reply).map(|_| ())
    }
}

/// Assemble one request frame: fixed header, request length, monitoring
/// timer, command and subcommand pairs, 3-byte head address, device
/// code, point count, then write data if any.
fn build_request(
    command: Command,
    mode: AccessMode,
    device: DeviceCode,
    addr: Address,
    cnt: Quantity,
    data: &[u8],
) -> Bytes {
    let header = RequestHeader::new();
    let mut buf = BytesMut::with_capacity(21 + data.len());

    buf.put_slice(header.bytes());
    buf.put_u16_le(0); // request length, patched below
    buf.put_u16_le(0x0000); // monitoring timer
    buf.put_slice(&command.bytes());
    buf.put_slice(&mode.bytes());
    // Head address, low 24 bits little-endian.
    buf.put_u16_le((addr & 0xFFFF) as u16);
    buf.put_u8((addr >> 16) as u8);
    buf.put_u8(device.code());
    buf.put_u16_le(cnt);
    buf.put_slice(data);

    // Everything after the length field counts, timer included.
    let request_len = (buf.len() - (REQUEST_LEN_OFFSET + 2)) as u16;
    LittleEndian::write_u16(
        &mut buf[REQUEST_LEN_OFFSET..REQUEST_LEN_OFFSET + 2],
        request_len,
    );

    buf.freeze()
}

/// Verify the reply envelope and return its payload.
fn check_reply(reply: &[u8]) -> Result<&[u8], Error> {
    if reply.len() < REPLY_PAYLOAD_OFFSET {
        return Err(FrameError::Truncated.into());
    }
    if reply[..RESPONSE_PREFIX.len()] != RESPONSE_PREFIX {
        return Err(FrameError::BadReplyPrefix.into());
    }
    let end_code = LittleEndian::read_u16(&reply[9..11]);
    if end_code != 0 {
        return Err(Error::Device(end_code));
    }
    Ok(&reply[REPLY_PAYLOAD_OFFSET..])
}
