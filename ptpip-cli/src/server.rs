//! Line-oriented TCP command server.
//!
//! One operator connection at a time: the client is the serialization
//! point for the camera, so commands run strictly in arrival order.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use ptpip_core::client::Client;

use crate::commands;

/// Accept operator connections and dispatch their command lines until
/// the process is stopped.
pub async fn run(client: &mut Client, address: &str, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind((address, port)).await?;
    info!(address, port, "command server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "operator connected");

        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(%peer, "read failed: {e}");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "quit" || trimmed == "exit" {
                break;
            }

            let response = commands::dispatch(client, trimmed).await;
            if write_half.write_all(response.as_bytes()).await.is_err() {
                break;
            }
        }
        info!(%peer, "operator disconnected");
    }
}
