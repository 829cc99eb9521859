use crate::types::Result;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type PushStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating push channel connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Open a new WebSocket connection
    pub async fn create(url: &str) -> Result<PushStream> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (stream, response) = connect_async(url).await?;
        tracing::debug!("Handshake completed with status {}", response.status());
        Ok(stream)
    }
}
