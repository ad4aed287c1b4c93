//! A single TCP client connection: frame parsing on the way in, raw output
//! mirroring on the way out. Splits the socket and spawns a read task the
//! same way InputPlumber's websocket acceptor splits a `WebSocketStream`
//! into a write sink plus a channel fed by a dedicated read task.
#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::Sender;

use crate::error::BridgeError;
use crate::report::input::WIRE_LEN as INPUT_WIRE_LEN;
use crate::report::output::LEN as OUTPUT_LEN;

const READ_BUF_SIZE: usize = 256;

/// A frame decoded from the client, per the wire protocol: opcode 0x01
/// doubles as the DS3 input report ID, so a full input frame is exactly the
/// 48 raw report bytes (the 49-byte in-memory buffer's final byte is never
/// carried on the wire); opcode 0xFF carries no body and asks the bridge to
/// shut down; anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFrame {
    Input([u8; INPUT_WIRE_LEN]),
    Shutdown,
}

/// One open connection. The Bridge guarantees at most one of these exists
/// at a time.
pub struct Session {
    remote: SocketAddr,
    write_half: OwnedWriteHalf,
    released: Arc<AtomicBool>,
}

impl Session {
    /// Take ownership of a freshly-accepted socket, split it, and spawn the
    /// read-side task. Decoded frames are sent on `frame_tx` tagged with
    /// this session's remote address; the returned `Session` is the
    /// write-side handle used for output mirroring.
    pub fn spawn(
        stream: TcpStream,
        remote: SocketAddr,
        frame_tx: Sender<(SocketAddr, SessionFrame)>,
    ) -> Self {
        let (mut read_half, write_half) = stream.into_split();
        let released = Arc::new(AtomicBool::new(false));
        let task_released = released.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; READ_BUF_SIZE];
            loop {
                let n = match read_half.read(&mut buf).await {
                    Ok(0) => {
                        log::info!("session {remote} closed by peer");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        log::warn!(
                            "{}",
                            BridgeError::SessionError {
                                remote: remote.to_string(),
                                source: e,
                            }
                        );
                        break;
                    }
                };

                let chunk = &buf[..n];
                if chunk.is_empty() || chunk.len() > INPUT_WIRE_LEN {
                    log::trace!(
                        "session {remote} dropped chunk of length {} (empty or over 48 bytes)",
                        chunk.len()
                    );
                    continue;
                }

                let frame = match chunk[0] {
                    0xFF => SessionFrame::Shutdown,
                    0x01 if chunk.len() == INPUT_WIRE_LEN => {
                        let mut bytes = [0u8; INPUT_WIRE_LEN];
                        bytes.copy_from_slice(chunk);
                        SessionFrame::Input(bytes)
                    }
                    other => {
                        log::trace!(
                            "session {remote} dropped frame: opcode {other:#x}, len {}",
                            chunk.len()
                        );
                        continue;
                    }
                };

                let is_shutdown = frame == SessionFrame::Shutdown;
                if frame_tx.send((remote, frame)).await.is_err() {
                    break;
                }
                if is_shutdown {
                    break;
                }
            }
            task_released.store(true, Ordering::SeqCst);
        });

        Self {
            remote,
            write_half,
            released,
        }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// `true` once the read side has observed the socket close, error, or a
    /// shutdown frame, or a write has failed. Checked before every output
    /// mirror attempt.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Write exactly 48 raw bytes, with no framing, to the client. Returns
    /// `false` without erroring once the session has already been
    /// released.
    pub async fn send_output(&mut self, payload: &[u8; OUTPUT_LEN]) -> bool {
        if self.is_released() {
            return false;
        }
        if let Err(e) = self.write_half.write_all(payload).await {
            log::warn!(
                "{}",
                BridgeError::SessionError {
                    remote: self.remote.to_string(),
                    source: e,
                }
            );
            self.released.store(true, Ordering::SeqCst);
            return false;
        }
        true
    }
}
