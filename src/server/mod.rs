//! Modbus/TCP server

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tracing::Instrument;

use crate::common::phys::PhysLayer;
use crate::error::Error;

mod handler;
mod task;

pub use handler::{ServerHandler, ServerHandlerType};

/// A Modbus/TCP server that accepts connections and spawns one session task per
/// connection.
///
/// All sessions share the handler; a session locks it for the duration of a single
/// request. Dropping the future returned by [`Server::run`] stops accepting new
/// connections; established sessions run until the peer closes or their idle timer
/// fires.
pub struct Server<H>
where
    H: ServerHandler,
{
    listener: TcpListener,
    handler: ServerHandlerType<H>,
}

impl<H> Server<H>
where
    H: ServerHandler,
{
    /// Create a server from an already-bound listener
    pub fn new(listener: TcpListener, handler: ServerHandlerType<H>) -> Self {
        Self { listener, handler }
    }

    /// Bind the IPv4 wildcard address on `port` ([`crate::constants::DEFAULT_PORT`]
    /// is the standard choice)
    pub async fn bind(port: u16, handler: ServerHandlerType<H>) -> Result<Self, Error> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
        Ok(Self::new(listener, handler))
    }

    /// Address the server is listening on, useful when bound to port zero
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until an accept error occurs
    pub async fn run(self) -> Result<(), Error> {
        loop {
            let (socket, addr) = self.listener.accept().await?;
            tracing::info!("accepted connection from: {}", addr);

            if let Err(err) = socket.set_nodelay(true) {
                tracing::warn!("unable to enable TCP_NODELAY: {}", err);
            }
            if let Err(err) = socket2::SockRef::from(&socket).set_keepalive(true) {
                tracing::warn!("unable to enable SO_KEEPALIVE: {}", err);
            }

            let handler = self.handler.clone();
            let span = tracing::Span::current();
            tokio::spawn(async move {
                let mut session = task::SessionTask::new(PhysLayer::new_tcp(socket), handler);
                let result = session
                    .run()
                    .instrument(tracing::info_span!(parent: &span, "Session", "remote" = ?addr))
                    .await;
                match result {
                    Ok(()) => tracing::info!("session from {} closed", addr),
                    Err(err) => tracing::warn!("session from {} failed: {}", addr, err),
                }
            });
        }
    }
}
