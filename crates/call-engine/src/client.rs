//! Line-oriented client for the hotline server.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::command::{Request, Response};
use crate::error::{HotlineError, Result};

/// Connected client
pub struct HotlineClient {
    sender: ClientSender,
    receiver: ClientReceiver,
}

/// Writing half of a client
pub struct ClientSender {
    writer: OwnedWriteHalf,
}

/// Reading half of a client
pub struct ClientReceiver {
    lines: Lines<BufReader<OwnedReadHalf>>,
}

impl HotlineClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        debug!("🔌 Connected to {}", stream.peer_addr()?);

        let (reader, writer) = stream.into_split();
        Ok(Self {
            sender: ClientSender { writer },
            receiver: ClientReceiver {
                lines: BufReader::new(reader).lines(),
            },
        })
    }

    pub async fn send(&mut self, request: &Request) -> Result<()> {
        self.sender.send(request).await
    }

    /// Send a typed line such as `call 1`
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.sender.send_line(line).await
    }

    /// Next response or notification, `None` once the server closes
    pub async fn next_message(&mut self) -> Result<Option<String>> {
        self.receiver.next_message().await
    }

    /// Next frame with its notification marker
    pub async fn next_frame(&mut self) -> Result<Option<Response>> {
        self.receiver.next_frame().await
    }

    /// Send a request and wait for the next frame
    ///
    /// With ring timers pending, that frame may be a notification instead of
    /// the response. Use [`next_frame`](Self::next_frame) to tell them apart.
    pub async fn request(&mut self, request: &Request) -> Result<String> {
        self.send(request).await?;
        self.next_message()
            .await?
            .ok_or_else(|| HotlineError::engine_unavailable("server closed the connection"))
    }

    /// Split into halves so reading and writing can run concurrently
    pub fn into_split(self) -> (ClientSender, ClientReceiver) {
        (self.sender, self.receiver)
    }
}

impl ClientSender {
    pub async fn send(&mut self, request: &Request) -> Result<()> {
        self.writer.write_all(request.to_line()?.as_bytes()).await?;
        Ok(())
    }

    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let request = Request::parse_line(line)?;
        self.send(&request).await
    }

    /// Close the write side of the connection
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl ClientReceiver {
    pub async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.next_frame().await?.map(|frame| frame.message))
    }

    pub async fn next_frame(&mut self) -> Result<Option<Response>> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(Response::from_json(&line)?));
        }
        Ok(None)
    }
}
