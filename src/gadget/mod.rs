//! The Gadget Host Adapter: an abstraction over the Linux FunctionFS /
//! ConfigFS collaborator (`ep0`, `epIn`, `epOut`) that the HID Function
//! drives. FunctionFS/ConfigFS themselves are out of scope for this
//! repository (spec §1); this module fixes only the interface the core
//! consumes: `bind`, `unbind`, `await_configured`, and endpoint read/write.
#[cfg(test)]
#[path = "mock_test.rs"]
mod mock_test;

mod functionfs;
mod mock;

pub use functionfs::FunctionFsGadget;
pub use mock::MockGadget;

use std::time::Duration;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Either the production FunctionFS-backed gadget or the in-memory mock
/// used by tests. Mirrors the target-device enum dispatch InputPlumber
/// uses instead of a boxed trait object, so no async-trait machinery is
/// needed for a component with exactly two implementations.
pub enum Gadget {
    FunctionFs(FunctionFsGadget),
    Mock(MockGadget),
}

impl Gadget {
    /// Bind the gadget: register the HID report descriptor and identity
    /// strings, then wait (up to `timeout`) for the host to configure the
    /// device. On any failure, everything already acquired is released
    /// before the error is returned.
    pub async fn bind(
        &mut self,
        descriptor: &'static [u8],
        config: &BridgeConfig,
        timeout: Duration,
    ) -> Result<(), BridgeError> {
        match self {
            Gadget::FunctionFs(g) => g.bind(descriptor, config, timeout).await,
            Gadget::Mock(g) => g.bind(descriptor, config, timeout).await,
        }
    }

    /// Read the next frame written by the host to `epOut`. Returns
    /// `EndpointError` on transient failure, which callers drop and retry
    /// on the next tick, or `EndpointClosed` if the endpoint has been torn
    /// down, which callers treat as fatal and release the function for.
    pub async fn read_ep_out(&mut self) -> Result<Vec<u8>, BridgeError> {
        match self {
            Gadget::FunctionFs(g) => g.read_ep_out().await,
            Gadget::Mock(g) => g.read_ep_out().await,
        }
    }

    /// Write a frame to `epIn`. Returns an `EndpointError` on transient
    /// failure.
    pub async fn write_ep_in(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        match self {
            Gadget::FunctionFs(g) => g.write_ep_in(bytes).await,
            Gadget::Mock(g) => g.write_ep_in(bytes).await,
        }
    }

    /// Release every endpoint and unbind from ConfigFS. Idempotent.
    pub async fn unbind(&mut self) -> Result<(), BridgeError> {
        match self {
            Gadget::FunctionFs(g) => g.unbind().await,
            Gadget::Mock(g) => g.unbind().await,
        }
    }
}
