use std::{net::SocketAddr, sync::Arc};

use tokio_mc_sim::server::{
    tcp::{accept_tcp_connection, listener, Server, Terminated},
    Emulator,
};

/// Fixed endpoint the dashboard is configured against.
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:6000";

/// Optional override, e.g. `MC_SIM_LISTEN=0.0.0.0:6000`.
const LISTEN_ADDR_ENV: &str = "MC_SIM_LISTEN";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let listen_addr =
        std::env::var(LISTEN_ADDR_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let socket_addr: SocketAddr = listen_addr.parse()?;

    let server = Server::new(listener(socket_addr)?);
    let service = Arc::new(Emulator::new());

    let on_connected = {
        let service = Arc::clone(&service);
        move |stream, socket_addr| {
            let service = Arc::clone(&service);
            async move {
                log::info!("Connected by {socket_addr}");
                accept_tcp_connection(stream, socket_addr, move |_| Ok(Some(Arc::clone(&service))))
            }
        }
    };

    let on_process_error = |err| {
        log::error!("Connection error: {err}");
    };

    log::info!("Mock PLC server listening on {socket_addr}");
    log::info!("Press Ctrl+C to stop");

    let ctrl_c = Box::pin(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {err}");
        }
    });

    match server
        .serve_until(&on_connected, on_process_error, ctrl_c)
        .await?
    {
        Terminated::Finished => {}
        Terminated::Aborted => log::info!("Stopping server"),
    }

    Ok(())
}
