//! Production [crate::gadget::Gadget] backed by the FunctionFS special
//! files a bound ConfigFS gadget exposes under
//! `/dev/functionfs/<instance>/`. FunctionFS/ConfigFS binding itself is an
//! external collaborator (spec §1); this module only performs the file
//! operations the kernel driver expects and trusts it to translate control
//! transfers into the descriptor the HID Function registered.
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

const FUNCTIONFS_DESCRIPTORS_MAGIC_V2: u32 = 3;

/// Reads and writes the `ep0`/`epIn`/`epOut` files FunctionFS exposes.
pub struct FunctionFsGadget {
    mount_path: String,
    ep0: Option<File>,
    ep_in: Option<File>,
    ep_out: Option<File>,
}

impl FunctionFsGadget {
    pub fn new(mount_path: impl Into<String>) -> Self {
        Self {
            mount_path: mount_path.into(),
            ep0: None,
            ep_in: None,
            ep_out: None,
        }
    }

    fn ep_path(&self, name: &str) -> String {
        format!("{}/{}", self.mount_path, name)
    }

    /// Builds the FunctionFS descriptor blob (magic + FS/HS/SS descriptor
    /// sets) that `ep0` expects on first write, per the kernel ABI
    /// documented in `Documentation/usb/functionfs.rst`.
    fn build_descriptor_blob(hid_report_descriptor: &[u8]) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&FUNCTIONFS_DESCRIPTORS_MAGIC_V2.to_le_bytes());
        // Length is patched in below once the body is known.
        blob.extend_from_slice(&[0u8; 4]);
        blob.extend_from_slice(&1u32.to_le_bytes()); // flags: FS descriptors only
        blob.extend_from_slice(&1u32.to_le_bytes()); // one interface descriptor
        blob.extend_from_slice(hid_report_descriptor);

        let len = blob.len() as u32;
        blob[4..8].copy_from_slice(&len.to_le_bytes());
        blob
    }

    fn build_strings_blob(config: &BridgeConfig) -> Vec<u8> {
        let mut blob = Vec::new();
        const FUNCTIONFS_STRINGS_MAGIC: u32 = 2;
        blob.extend_from_slice(&FUNCTIONFS_STRINGS_MAGIC.to_le_bytes());
        blob.extend_from_slice(&[0u8; 4]); // length, patched below
        blob.extend_from_slice(&1u32.to_le_bytes()); // one language
        blob.extend_from_slice(&0x0409u16.to_le_bytes()); // en-US
        for s in [&config.gadget.manufacturer, &config.gadget.product] {
            blob.extend_from_slice(s.as_bytes());
            blob.push(0);
        }
        let len = blob.len() as u32;
        blob[4..8].copy_from_slice(&len.to_le_bytes());
        blob
    }

    pub async fn bind(
        &mut self,
        descriptor: &'static [u8],
        config: &BridgeConfig,
        configured_timeout: Duration,
    ) -> Result<(), BridgeError> {
        let result = self.bind_inner(descriptor, config, configured_timeout).await;
        if result.is_err() {
            let _ = self.unbind().await;
        }
        result
    }

    async fn bind_inner(
        &mut self,
        descriptor: &'static [u8],
        config: &BridgeConfig,
        configured_timeout: Duration,
    ) -> Result<(), BridgeError> {
        let ep0_path = self.ep_path("ep0");
        let mut ep0 = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&ep0_path)
            .await
            .map_err(|e| BridgeError::BindFailure(format!("open {ep0_path}: {e}")))?;

        let descriptors = Self::build_descriptor_blob(descriptor);
        ep0.write_all(&descriptors)
            .await
            .map_err(|e| BridgeError::BindFailure(format!("write descriptors: {e}")))?;

        let strings = Self::build_strings_blob(config);
        ep0.write_all(&strings)
            .await
            .map_err(|e| BridgeError::BindFailure(format!("write strings: {e}")))?;

        self.ep0 = Some(ep0);

        timeout(configured_timeout, self.await_configured())
            .await
            .map_err(|_| BridgeError::BindFailure("timed out waiting for configured state".into()))??;

        let ep_in_path = self.ep_path("ep1");
        let ep_in = OpenOptions::new()
            .write(true)
            .open(&ep_in_path)
            .await
            .map_err(|e| BridgeError::BindFailure(format!("open {ep_in_path}: {e}")))?;
        self.ep_in = Some(ep_in);

        let ep_out_path = self.ep_path("ep2");
        let ep_out = OpenOptions::new()
            .read(true)
            .open(&ep_out_path)
            .await
            .map_err(|e| BridgeError::BindFailure(format!("open {ep_out_path}: {e}")))?;
        self.ep_out = Some(ep_out);

        Ok(())
    }

    /// Wait for the host to enumerate and configure the gadget. FunctionFS
    /// signals this with a `FUNCTIONFS_BIND`/`FUNCTIONFS_ENABLE` event read
    /// from `ep0`; we read and discard events until enable, or the socket
    /// closes.
    async fn await_configured(&mut self) -> Result<(), BridgeError> {
        const FUNCTIONFS_ENABLE: u8 = 2;
        let ep0 = self
            .ep0
            .as_mut()
            .ok_or_else(|| BridgeError::BindFailure("ep0 not open".into()))?;

        let mut event = [0u8; 4];
        loop {
            let n = ep0
                .read(&mut event)
                .await
                .map_err(|e| BridgeError::BindFailure(format!("read ep0 event: {e}")))?;
            if n == 0 {
                return Err(BridgeError::BindFailure("ep0 closed before enable".into()));
            }
            if event[0] == FUNCTIONFS_ENABLE {
                return Ok(());
            }
        }
    }

    /// Reads the next frame from `epOut`. A zero-byte read means the
    /// endpoint file has been closed (the kernel tore down the gadget out
    /// from under us) and is reported as [BridgeError::EndpointClosed],
    /// distinct from a transient [BridgeError::EndpointError] the caller
    /// can just drop and retry on the next tick.
    pub async fn read_ep_out(&mut self) -> Result<Vec<u8>, BridgeError> {
        let ep_out = self
            .ep_out
            .as_mut()
            .ok_or_else(|| BridgeError::EndpointClosed("epOut not open".into()))?;
        let mut buf = vec![0u8; 64];
        let n = ep_out
            .read(&mut buf)
            .await
            .map_err(|e| BridgeError::EndpointError(format!("read epOut: {e}")))?;
        if n == 0 {
            return Err(BridgeError::EndpointClosed(
                "epOut read returned EOF".into(),
            ));
        }
        buf.truncate(n);
        Ok(buf)
    }

    pub async fn write_ep_in(&mut self, bytes: &[u8]) -> Result<(), BridgeError> {
        let ep_in = self
            .ep_in
            .as_mut()
            .ok_or_else(|| BridgeError::EndpointError("epIn not open".into()))?;
        ep_in
            .write_all(bytes)
            .await
            .map_err(|e| BridgeError::EndpointError(format!("write epIn: {e}")))
    }

    pub async fn unbind(&mut self) -> Result<(), BridgeError> {
        self.ep_in = None;
        self.ep_out = None;
        self.ep0 = None;
        Ok(())
    }
}
