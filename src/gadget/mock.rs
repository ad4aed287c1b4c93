//! In-memory stand-in for the Gadget Host Adapter, used by tests so the
//! HID Function and Bridge can be exercised without root or a real kernel
//! gadget.
use std::collections::VecDeque;
use std::time::Duration;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

#[derive(Default)]
pub struct MockGadget {
    pub bound: bool,
    pub last_descriptor: Option<&'static [u8]>,
    /// Every frame written to `epIn`, in order.
    pub written_to_ep_in: Vec<Vec<u8>>,
    /// Frames to hand back from `read_ep_out`, consumed in order.
    pub ep_out_queue: VecDeque<Vec<u8>>,
    /// When set, the next `read_ep_out` call fails with this message
    /// instead of returning a queued frame.
    pub fail_next_read: Option<String>,
    /// When set, the next `read_ep_out` call reports the endpoint as
    /// fatally closed instead of returning a queued frame, simulating a
    /// real `epOut` read hitting EOF.
    pub close_next_read: bool,
    /// When set, every `write_ep_in` call fails with this message.
    pub fail_writes: Option<String>,
}

impl MockGadget {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bind(
        &mut self,
        descriptor: &'static [u8],
        _config: &BridgeConfig,
        _timeout: Duration,
    ) -> Result<(), BridgeError> {
        self.bound = true;
        self.last_descriptor = Some(descriptor);
        Ok(())
    }

    /// Mirrors a real `epOut` read: blocks (never resolves) when no frame
    /// is queued, rather than erroring, so a `Bridge::run` select loop
    /// backed by a `MockGadget` doesn't spin.
    pub async fn read_ep_out(&mut self) -> Result<Vec<u8>, BridgeError> {
        if let Some(msg) = self.fail_next_read.take() {
            return Err(BridgeError::EndpointError(msg));
        }
        if self.close_next_read {
            self.close_next_read = false;
            return Err(BridgeError::EndpointClosed(
                "simulated epOut closure".to_string(),
            ));
        }
        match self.ep_out_queue.pop_front() {
            Some(frame) => Ok(frame),
            None => std::future::pending().await,
        }
    }

    pub async fn write_ep_in(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        if let Some(msg) = &self.fail_writes {
            return Err(BridgeError::EndpointError(msg.clone()));
        }
        self.written_to_ep_in.push(bytes.to_vec());
        Ok(())
    }

    pub async fn unbind(&mut self) -> Result<(), BridgeError> {
        self.bound = false;
        Ok(())
    }
}
