//! The Bridge: binds the gadget, publishes the discovery file, accepts at
//! most one TCP client at a time, and runs the sampler loop that moves
//! bytes between the two sides. Owns the gadget, the listener, the current
//! session, and the sampler timer; the HID Function underneath it owns
//! only the three report buffers (see `DESIGN.md`).

mod session;

pub use session::{Session, SessionFrame};

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::interval;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::gadget::{FunctionFsGadget, Gadget};
use crate::hid_function::HidFunction;
use crate::report::descriptor::REPORT_DESCRIPTOR;

const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Owns the whole bridge lifecycle once bound: the gadget, the listener,
/// the current (at most one) session, and the HID Function state they both
/// feed.
pub struct Bridge {
    config: BridgeConfig,
    listener: TcpListener,
    gadget: Gadget,
    hid: HidFunction,
    session: Option<Session>,
    frame_tx: Sender<(SocketAddr, SessionFrame)>,
    frame_rx: Receiver<(SocketAddr, SessionFrame)>,
    released: bool,
}

impl Bridge {
    /// Bind the production FunctionFS gadget, listen on an ephemeral TCP
    /// port, and publish `"<pid>:<port>"` to the configured process file.
    pub async fn start(config: BridgeConfig) -> Result<Self, BridgeError> {
        let gadget = Gadget::FunctionFs(FunctionFsGadget::new(config.functionfs_mount.clone()));
        Self::start_with_gadget(config, gadget).await
    }

    /// Same as [Self::start], but with the gadget implementation supplied
    /// by the caller. Production code always passes a `FunctionFs` gadget;
    /// tests pass a `Mock` one.
    pub async fn start_with_gadget(config: BridgeConfig, mut gadget: Gadget) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| BridgeError::BindFailure(format!("listen: {e}")))?;

        let bind_timeout = Duration::from_secs(config.bind_timeout_secs);
        gadget
            .bind(&REPORT_DESCRIPTOR, &config, bind_timeout)
            .await?;

        if let Err(e) = Self::publish_process_file(&config, listener.local_addr()) {
            let _ = gadget.unbind().await;
            return Err(e);
        }

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            listener,
            gadget,
            hid: HidFunction::new(),
            session: None,
            frame_tx,
            frame_rx,
            released: false,
        })
    }

    fn publish_process_file(
        config: &BridgeConfig,
        local_addr: std::io::Result<SocketAddr>,
    ) -> Result<(), BridgeError> {
        let local_addr =
            local_addr.map_err(|e| BridgeError::BindFailure(format!("local_addr: {e}")))?;
        std::fs::create_dir_all(&config.bridge_dir)
            .map_err(|e| BridgeError::BindFailure(format!("create {}: {e}", config.bridge_dir)))?;
        let contents = format!("{}:{}", nix::unistd::getpid(), local_addr.port());
        std::fs::write(config.process_file_path(), contents)
            .map_err(|e| BridgeError::BindFailure(format!("write process file: {e}")))
    }

    /// The ephemeral TCP port clients connect to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener
            .local_addr()
            .expect("listener is bound for the lifetime of the Bridge")
    }

    /// Drive the sampler loop until a client sends the shutdown opcode, a
    /// fatal `epOut` closure is detected, or the listener fails. Does not
    /// itself release the gadget; call [Self::release] afterward.
    pub async fn run(&mut self) -> Result<(), BridgeError> {
        let mut sampler = interval(Duration::from_millis(self.config.sampler_interval_ms));
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, remote)) => self.handle_accept(stream, remote),
                        Err(e) => log::warn!("accept error: {e}"),
                    }
                }
                ep_out = self.gadget.read_ep_out() => {
                    match ep_out {
                        Ok(bytes) => {
                            if let Err(e) = self.hid.handle_ep_out_frame(&bytes) {
                                log::trace!("epOut: {e}");
                            }
                        }
                        Err(e @ BridgeError::EndpointClosed(_)) => {
                            log::error!("{e}");
                            return Err(e);
                        }
                        Err(e) => log::trace!("epOut read error: {e}"),
                    }
                }
                Some((remote, frame)) = self.frame_rx.recv() => {
                    if self.handle_frame(remote, frame) {
                        break;
                    }
                }
                _ = sampler.tick() => {
                    self.on_sampler_tick().await;
                }
            }
        }
        Ok(())
    }

    fn handle_accept(&mut self, stream: TcpStream, remote: SocketAddr) {
        if let Some(session) = &self.session {
            if !session.is_released() {
                log::warn!("{}", BridgeError::ExtraConnection(remote.to_string()));
                drop(stream);
                return;
            }
        }
        log::info!("session opened: {remote}");
        self.session = Some(Session::spawn(stream, remote, self.frame_tx.clone()));
    }

    /// Returns `true` if the frame was a shutdown request.
    fn handle_frame(&mut self, remote: SocketAddr, frame: SessionFrame) -> bool {
        match frame {
            SessionFrame::Input(bytes) => {
                self.hid.apply_input_frame(&bytes);
                false
            }
            SessionFrame::Shutdown => {
                log::info!("shutdown requested by {remote}");
                true
            }
        }
    }

    async fn on_sampler_tick(&mut self) {
        if self.hid.input_streaming_enabled() {
            if let Err(e) = self.gadget.write_ep_in(&self.hid.input_bytes()).await {
                log::trace!("epIn write error: {e}");
            }
        }
        if let Some(session) = &mut self.session {
            if !session.is_released() {
                session.send_output(&self.hid.output_bytes()).await;
            }
        }
    }

    /// Idempotent teardown: drop the session, unbind the gadget, and remove
    /// the process file.
    pub async fn release(&mut self) -> Result<(), BridgeError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.session = None;
        self.gadget.unbind().await?;
        let _ = std::fs::remove_file(self.config.process_file_path());
        Ok(())
    }
}
