use crate::events::InboundEvent;
use crate::message::{AppMessage, MessageError, WatchMessage};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How messages are framed on the byte stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// One JSON object per line, decimal key ids to integers
    #[default]
    Json,
    /// Binary dictionary behind a little-endian `u16` length
    Dictionary,
}

/// Outbound path to the watch. Each message is delivered whole or not at all.
pub trait WatchChannel: Send + Sync {
    fn send(&self, message: &WatchMessage)
        -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Writes framed messages to a byte stream, stdout in production
pub struct StreamChannel<W> {
    writer: Mutex<W>,
    format: WireFormat,
}

impl<W: AsyncWrite + Unpin + Send> StreamChannel<W> {
    pub fn new(writer: W, format: WireFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl StreamChannel<tokio::io::Stdout> {
    pub fn stdout(format: WireFormat) -> Self {
        Self::new(tokio::io::stdout(), format)
    }
}

impl<W: AsyncWrite + Unpin + Send> WatchChannel for StreamChannel<W> {
    async fn send(&self, message: &WatchMessage) -> Result<(), ChannelError> {
        let frame = encode_frame(&message.to_app_message(), self.format)?;

        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await?;
        writer.flush().await?;

        tracing::debug!("Sent {} byte frame to watch", frame.len());
        Ok(())
    }
}

/// Frame one message. Messages over the watch's size bounds are rejected.
pub fn encode_frame(message: &AppMessage, format: WireFormat) -> Result<Vec<u8>, ChannelError> {
    message.check_bounds()?;

    match format {
        WireFormat::Json => {
            let mut line = serde_json::to_vec(message)?;
            line.push(b'\n');
            Ok(line)
        }
        WireFormat::Dictionary => {
            let body = message.encode()?;
            let mut frame = Vec::with_capacity(2 + body.len());
            // Bounded by MAX_MESSAGE_SIZE, so it always fits
            frame.extend_from_slice(&(body.len() as u16).to_le_bytes());
            frame.extend_from_slice(&body);
            Ok(frame)
        }
    }
}

/// Read the next framed message; `None` at end of stream
pub async fn read_frame<R>(
    reader: &mut R,
    format: WireFormat,
) -> Result<Option<AppMessage>, ChannelError>
where
    R: AsyncBufRead + Unpin,
{
    match format {
        WireFormat::Json => {
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).await? == 0 {
                    return Ok(None);
                }
                if !line.trim().is_empty() {
                    return Ok(Some(serde_json::from_str(line.trim())?));
                }
            }
        }
        WireFormat::Dictionary => {
            let mut length = [0u8; 2];
            match reader.read_exact(&mut length).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let mut body = vec![0u8; usize::from(u16::from_le_bytes(length))];
            reader.read_exact(&mut body).await?;
            Ok(Some(AppMessage::decode(&body)?))
        }
    }
}

/// Forward requests read from `reader` until it closes.
///
/// Malformed messages are logged and skipped.
pub fn spawn_inbound_reader<R>(
    mut reader: R,
    format: WireFormat,
    events: mpsc::UnboundedSender<InboundEvent>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match read_frame(&mut reader, format).await {
                Ok(Some(message)) => match InboundEvent::from_app_message(&message) {
                    Some(event) => {
                        tracing::debug!("Inbound event: {:?}", event);
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("Ignoring inbound message with {} keys", message.len())
                    }
                },
                Ok(None) => {
                    tracing::info!("Watch input closed");
                    break;
                }
                Err(ChannelError::Io(e)) => {
                    tracing::error!("Failed to read from watch: {}", e);
                    break;
                }
                Err(e) => tracing::warn!("Skipping malformed inbound message: {}", e),
            }
        }
    })
}
