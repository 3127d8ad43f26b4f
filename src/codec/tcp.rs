use std::io::Result;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    frame::Response,
    header::{ResponseHeader, END_CODE_SUCCESS},
};

/// Server side of the wire: delineates request frames and writes reply
/// envelopes.
///
/// One socket read is one frame. Frames split across reads are not
/// reassembled and multiple frames arriving in a single read are treated
/// as one, reproducing how the device this stands in for is driven.
/// Frame shape is NOT validated here; the session loop decides whether a
/// delineated frame deserves a reply, so a garbage frame never errors
/// the connection out.
#[derive(Debug, Default)]
pub struct ServerCodec;

impl Decoder for ServerCodec {
    type Item = Bytes;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>> {
        if buf.is_empty() {
            return Ok(None);
        }
        let frame = buf.split_to(buf.len()).freeze();
        log::debug!("Received frame: {:02X?}", &frame[..]);
        Ok(Some(frame))
    }
}

impl Encoder<Response> for ServerCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Response, buf: &mut BytesMut) -> Result<()> {
        let header = ResponseHeader::new();
        let data_length = (2 + item.payload_len()) as u16;

        buf.reserve(header.len() + 4 + item.payload_len());
        buf.put_slice(header.bytes());
        buf.put_u16_le(data_length);
        buf.put_u16_le(END_CODE_SUCCESS);

        match item {
            Response::ReadWords(words) => {
                for word in words {
                    buf.put_u16_le(word);
                }
            }
            Response::ReadBits(bytes) => buf.put_slice(&bytes),
            Response::WriteAck() | Response::Empty() => {}
        }

        log::debug!("Encoded reply: {:02X?}", &buf[..]);
        Ok(())
    }
}
