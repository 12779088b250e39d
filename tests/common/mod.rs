//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use catalog_server::config::{ServerConfig, StorageBackend};
use catalog_server::{start_server, ServerHandle};

/// A server bound to an ephemeral port, running on its own task.
pub struct TestServer {
    pub handle: ServerHandle,
    pub task: JoinHandle<()>,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr(), path)
    }

    /// Stop the server and wait for `start` to return.
    pub async fn shutdown(self) {
        self.handle.stop();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .expect("server task panicked");
    }
}

/// In-memory storage, no monitor, ephemeral port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.listener.drain_timeout_secs = 2;
    config.monitor.enabled = false;
    config.storage.backend = StorageBackend::Memory;
    config
}

pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let server = start_server(&config).await.expect("server failed to start");
    let handle = server.handle();
    let task = tokio::spawn(server.start());
    TestServer { handle, task }
}

/// Client that never routes loopback traffic through a proxy from the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Write raw bytes, half-close, and collect everything the server sends back.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&out).into_owned()
}
