use tokio::io::{AsyncReadExt, AsyncWriteExt};

// encapsulates the physical layer so that sessions and tests share one code path
pub(crate) enum PhysLayer {
    Tcp(tokio::net::TcpStream),
    #[cfg(test)]
    Mock(tokio_test::io::Mock),
}

impl std::fmt::Debug for PhysLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PhysLayer::Tcp(_) => f.write_str("Tcp"),
            #[cfg(test)]
            PhysLayer::Mock(_) => f.write_str("Mock"),
        }
    }
}

impl PhysLayer {
    pub(crate) fn new_tcp(socket: tokio::net::TcpStream) -> Self {
        PhysLayer::Tcp(socket)
    }

    #[cfg(test)]
    pub(crate) fn new_mock(mock: tokio_test::io::Mock) -> Self {
        PhysLayer::Mock(mock)
    }

    pub(crate) async fn read_exact(&mut self, buffer: &mut [u8]) -> Result<(), std::io::Error> {
        match self {
            PhysLayer::Tcp(x) => {
                x.read_exact(buffer).await?;
            }
            #[cfg(test)]
            PhysLayer::Mock(x) => {
                x.read_exact(buffer).await?;
            }
        }
        tracing::trace!("PHYS RX - {} bytes", buffer.len());
        Ok(())
    }

    pub(crate) async fn write(&mut self, data: &[u8]) -> Result<(), std::io::Error> {
        tracing::trace!("PHYS TX - {} bytes", data.len());
        match self {
            PhysLayer::Tcp(x) => x.write_all(data).await,
            #[cfg(test)]
            PhysLayer::Mock(x) => x.write_all(data).await,
        }
    }

    pub(crate) async fn shutdown(&mut self) -> Result<(), std::io::Error> {
        match self {
            PhysLayer::Tcp(x) => x.shutdown().await,
            #[cfg(test)]
            PhysLayer::Mock(x) => x.shutdown().await,
        }
    }
}
