use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::error::Error;

use super::{Client, Context};

/// Connect to an emulator (or a real device) and wrap the connection in
/// a typed [`Context`].
pub async fn connect(socket_addr: SocketAddr) -> Result<Context<TcpClient>, Error> {
    let client = TcpClient::new(socket_addr).await?;
    Ok(Context::new(client))
}

#[derive(Debug)]
pub struct TcpClient {
    stream: TcpStream,
}

impl TcpClient {
    pub async fn new(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        log::debug!("Connected to {addr}");
        Ok(Self { stream })
    }
}

#[async_trait]
impl Client for TcpClient {
    async fn call(&mut self, request: Bytes) -> Result<Bytes, Error> {
        log::debug!("Sending request: {:02X?}", &request[..]);
        self.stream.write_all(&request).await?;

        // One read per reply, mirroring the exchange discipline the
        // device side assumes.
        let mut buffer = vec![0; 4096];
        let n = self.stream.read(&mut buffer).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before a reply arrived",
            )
            .into());
        }

        log::debug!("Received reply: {:02X?}", &buffer[..n]);
        Ok(Bytes::copy_from_slice(&buffer[..n]))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::net::TcpListener;

    use super::*;
    use crate::{
        frame::DeviceCode,
        server::{
            tcp::{accept_tcp_connection, Server},
            Emulator,
        },
    };

    async fn spawn_emulator() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let service = Arc::new(Emulator::new());
        tokio::spawn(async move {
            let on_connected = {
                let service = Arc::clone(&service);
                move |stream, socket_addr| {
                    let service = Arc::clone(&service);
                    async move {
                        accept_tcp_connection(stream, socket_addr, move |_| {
                            Ok(Some(Arc::clone(&service)))
                        })
                    }
                }
            };
            let server = Server::new(listener);
            let _ = tokio::time::timeout(
                Duration::from_secs(5),
                server.serve(&on_connected, |_err| {}),
            )
            .await;
        });

        addr
    }

    #[tokio::test]
    async fn reads_words_from_a_live_emulator() {
        let addr = spawn_emulator().await;
        let mut ctx = connect(addr).await.unwrap();

        let words = ctx.read_words(DeviceCode::D, 0, 5).await.unwrap();
        assert_eq!(words.len(), 5);
        assert!(words.iter().all(|w| (100..=200).contains(w)));
    }

    #[tokio::test]
    async fn reads_bits_from_a_live_emulator() {
        let addr = spawn_emulator().await;
        let mut ctx = connect(addr).await.unwrap();

        let bits = ctx.read_bits(DeviceCode::X, 0x10, 7).await.unwrap();
        assert_eq!(bits.len(), 7);
        assert!(bits.iter().all(|&b| b), "emulator reports every point ON");
    }

    #[tokio::test]
    async fn writes_are_acknowledged_by_a_live_emulator() {
        let addr = spawn_emulator().await;
        let mut ctx = connect(addr).await.unwrap();

        ctx.write_words(DeviceCode::D, 100, &[11, 42]).await.unwrap();
        ctx.write_bits(DeviceCode::M, 0, &[true, false, true])
            .await
            .unwrap();

        // The emulator holds no memory: a read after a write still
        // synthesizes fresh values instead of echoing what was written.
        let words = ctx.read_words(DeviceCode::D, 100, 2).await.unwrap();
        assert!(words.iter().all(|w| (100..=200).contains(w)));
    }

    #[tokio::test]
    async fn sequential_exchanges_share_one_connection() {
        let addr = spawn_emulator().await;
        let mut ctx = connect(addr).await.unwrap();

        for _ in 0..3 {
            let words = ctx.read_words(DeviceCode::D, 0, 2).await.unwrap();
            assert_eq!(words.len(), 2);
        }
    }
}
