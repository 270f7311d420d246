//! TCP listener.

use crate::service::FileService;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

/// Accepts connections and serves one call per connection
pub struct Server {
    listener: TcpListener,
    service: FileService,
}

impl Server {
    /// Bind to `addr`
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, service: FileService) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, service })
    }

    /// Address the listener is bound to
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The service connections are dispatched to
    #[must_use]
    pub fn service(&self) -> &FileService {
        &self.service
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Calls still in flight at shutdown are cancelled; partially uploaded
    /// files are removed as their sessions are dropped.
    ///
    /// # Errors
    ///
    /// Currently infallible; accept errors are logged and skipped.
    pub async fn run_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutting down ({} calls in flight)", connections.len());
                    break;
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("Accept failed: {}", e);
                            continue;
                        }
                    };

                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(%peer, "Failed to set TCP_NODELAY: {}", e);
                    }
                    self.service.stats().record_connection();
                    tracing::debug!(%peer, "Connection accepted");

                    let service = self.service.clone();
                    connections.spawn(async move {
                        if let Err(e) = service.handle_connection(stream).await {
                            tracing::warn!(%peer, "Call failed: {}", e);
                        }
                    });
                }
            }
        }

        connections.shutdown().await;
        Ok(())
    }

    /// Serve forever
    ///
    /// # Errors
    ///
    /// See [`Server::run_until`].
    pub async fn run(self) -> io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestream_core::{Call, FileRequest, FramedStream, Message};
    use filestream_files::StorageRoot;
    use tempfile::TempDir;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();

        let service = FileService::new(StorageRoot::new(dir.path()), 1024);
        let stats = service.stats().clone();
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), service)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async move {
            let _ = stop_rx.await;
        }));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut framed = FramedStream::new(stream);
        framed
            .write_message(&Message::Open(Call::GetMetadata(FileRequest::new(
                "hello.txt",
            ))))
            .await
            .unwrap();

        match framed.expect_message().await.unwrap() {
            Message::Metadata(meta) => assert_eq!(meta.size, 5),
            other => panic!("unexpected reply: {other:?}"),
        }

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connections, 1);
        assert_eq!(snapshot.metadata_lookups, 1);
    }
}
