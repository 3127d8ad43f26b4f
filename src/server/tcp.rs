use std::{future::Future, io, net::SocketAddr};

use futures_util::{FutureExt as _, SinkExt as _, StreamExt as _};
use socket2::{Domain, Socket, Type};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tokio_util::codec::Framed;

use crate::{
    codec::ServerCodec,
    frame::{FrameView, Request, Response},
};

use super::Service;

/// Server termination status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminated {
    /// Server finished normally
    Finished,
    /// Server was aborted by signal
    Aborted,
}

/// Accept unencrypted TCP connections.
pub fn accept_tcp_connection<S, NewService>(
    stream: TcpStream,
    socket_addr: SocketAddr,
    new_service: NewService,
) -> io::Result<Option<(S, TcpStream)>>
where
    S: Service<Request = Request, Response = Response> + Send + Sync + 'static,
    S::Exception: Send,
    NewService: Fn(SocketAddr) -> io::Result<Option<S>>,
{
    let service = new_service(socket_addr)?;
    Ok(service.map(|service| (service, stream)))
}

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub fn new(listener: TcpListener) -> Self {
        Self { listener }
    }

    /// Listens for incoming connections and starts an emulator session
    /// task for each connection.
    ///
    /// `OnConnected` is responsible for creating the service for the
    /// underlying TCP stream. If `OnConnected` returns with `Err` then
    /// listening stops and [`Self::serve()`] returns with an error. If
    /// `OnConnected` returns `Ok(None)` then the connection is rejected
    /// but [`Self::serve()`] continues listening for new connections.
    ///
    /// A faulty session never takes the listener down: per-connection
    /// I/O errors are routed to `on_process_error` and accepting
    /// continues.
    pub async fn serve<S, T, F, OnConnected, OnProcessError>(
        &self,
        on_connected: &OnConnected,
        on_process_error: OnProcessError,
    ) -> io::Result<()>
    where
        S: Service<Request = Request, Response = Response> + Send + Sync + 'static,
        S::Exception: Send + std::fmt::Debug,
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        OnConnected: Fn(TcpStream, SocketAddr) -> F,
        F: Future<Output = io::Result<Option<(S, T)>>>,
        OnProcessError: FnOnce(io::Error) + Clone + Send + 'static,
    {
        loop {
            let (stream, socket_addr) = self.listener.accept().await?;
            log::debug!("Accepted connection from {socket_addr}");

            let Some((service, transport)) = on_connected(stream, socket_addr).await? else {
                log::debug!("No service for connection from {socket_addr}");
                continue;
            };
            let on_process_error = on_process_error.clone();

            let framed = Framed::new(transport, ServerCodec);

            tokio::spawn(async move {
                log::debug!("Processing requests from {socket_addr}");
                if let Err(err) = process(framed, service).await {
                    on_process_error(err);
                }
                log::debug!("Connection from {socket_addr} closed");
            });
        }
    }

    /// Start an abortable emulator server task.
    ///
    /// Warning: Request processing is not scoped and could be aborted at
    /// any internal await point! See also:
    /// <https://rust-lang.github.io/wg-async/vision/roadmap/scopes.html#cancellation>
    pub async fn serve_until<S, T, F, X, OnConnected, OnProcessError>(
        self,
        on_connected: &OnConnected,
        on_process_error: OnProcessError,
        abort_signal: X,
    ) -> io::Result<Terminated>
    where
        S: Service<Request = Request, Response = Response> + Send + Sync + 'static,
        S::Exception: Send + std::fmt::Debug,
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        X: Future<Output = ()> + Send + Unpin + 'static,
        OnConnected: Fn(TcpStream, SocketAddr) -> F,
        F: Future<Output = io::Result<Option<(S, T)>>>,
        OnProcessError: FnOnce(io::Error) + Clone + Send + 'static,
    {
        let abort_signal = abort_signal.fuse();
        tokio::select! {
            res = self.serve(on_connected, on_process_error) => {
                res.map(|()| Terminated::Finished)
            },
            () = abort_signal => {
                Ok(Terminated::Aborted)
            }
        }
    }
}

/// The request-reply session loop spawned by [`Server::serve`] for each
/// client.
///
/// Frames that fail shape validation are dropped without a reply and the
/// session keeps going; only end-of-stream, transport errors, or a
/// service fault end it.
async fn process<S, T>(mut framed: Framed<T, ServerCodec>, service: S) -> io::Result<()>
where
    S: Service<Request = Request, Response = Response> + Send + Sync + 'static,
    S::Exception: Send + std::fmt::Debug,
    T: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let Some(frame) = framed.next().await.transpose().inspect_err(|err| {
            log::debug!("Failed to read request frame: {err}");
        })?
        else {
            log::debug!("TCP socket has been closed");
            break;
        };

        let view = match FrameView::new(&frame) {
            Ok(view) => view,
            Err(err) => {
                log::warn!("Dropping invalid frame ({err}): {:02X?}", &frame[..]);
                continue;
            }
        };

        let request = view.to_request();
        match service.call(request).await {
            Ok(response) => {
                framed.send(response).await.inspect_err(|err| {
                    log::debug!("Failed to send reply (command = {}): {err}", request.command);
                })?;
            }
            Err(exc) => {
                // Faults stay inside this connection; the listener is
                // unaffected.
                log::warn!("Service fault (command = {}): {exc:?}", request.command);
                break;
            }
        }
    }

    Ok(())
}

/// Configure and open the listening socket with address reuse enabled,
/// so a restarted emulator can rebind immediately.
pub fn listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => Socket::new(Domain::IPV4, Type::STREAM, None)?,
        SocketAddr::V6(_) => Socket::new(Domain::IPV6, Type::STREAM, None)?,
    };
    socket.reuse_address()?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}
