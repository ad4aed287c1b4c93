//! Deployment configuration: well-known paths and USB gadget identity.
//!
//! Defaults match the literals in the external interfaces section exactly;
//! every value can be overridden by an optional YAML file (`--config`) so
//! none of it needs to be hard-coded into the core.
#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BRIDGE_DIR: &str = "/data/local/tmp/ds3_bridge";
const DEFAULT_PROCESS_FILE: &str = "process.txt";
const DEFAULT_STAGED_LIBRARY: &str = "libaio.so";
const DEFAULT_FUNCTIONFS_MOUNT: &str = "/dev/functionfs/ds3";

/// Possible errors loading a [BridgeConfig] from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read config file: {0}")]
    IoError(#[from] io::Error),
    #[error("unable to parse config: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// USB gadget identity strings, per the vendor/product/string descriptors
/// a real DS3 reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GadgetIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
}

impl Default for GadgetIdentity {
    fn default() -> Self {
        Self {
            vendor_id: 0x054C,
            product_id: 0x0268,
            manufacturer: "Sony Computer Entertainment Inc.".to_string(),
            product: "PLAYSTATION(R)3 Controller".to_string(),
            serial: "SN00000000".to_string(),
        }
    }
}

/// Runtime configuration for the bridge. Every well-known path that the
/// source material hard-codes is parameterized here instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct BridgeConfig {
    /// Directory staged files and the process discovery file live under.
    pub bridge_dir: String,
    /// File name (relative to `bridge_dir`) announcing `"<pid>:<port>"`.
    pub process_file: String,
    /// File name (relative to `bridge_dir`) of the staged shared library.
    pub staged_library: String,
    /// Directory the FunctionFS instance is mounted at, exposing
    /// `ep0`/`ep1`/`ep2`.
    #[serde(default = "default_functionfs_mount")]
    pub functionfs_mount: String,
    /// Gadget USB identity.
    #[serde(default)]
    pub gadget: GadgetIdentity,
    /// Sampler interval for both the input and output mirrors, in
    /// milliseconds.
    #[serde(default = "default_sampler_interval_ms")]
    pub sampler_interval_ms: u64,
    /// How long `start()` will wait for the gadget to report configured
    /// before giving up with `BindFailure`.
    #[serde(default = "default_bind_timeout_secs")]
    pub bind_timeout_secs: u64,
}

fn default_functionfs_mount() -> String {
    DEFAULT_FUNCTIONFS_MOUNT.to_string()
}

fn default_sampler_interval_ms() -> u64 {
    10
}

fn default_bind_timeout_secs() -> u64 {
    30
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge_dir: DEFAULT_BRIDGE_DIR.to_string(),
            process_file: DEFAULT_PROCESS_FILE.to_string(),
            staged_library: DEFAULT_STAGED_LIBRARY.to_string(),
            functionfs_mount: DEFAULT_FUNCTIONFS_MOUNT.to_string(),
            gadget: GadgetIdentity::default(),
            sampler_interval_ms: default_sampler_interval_ms(),
            bind_timeout_secs: default_bind_timeout_secs(),
        }
    }
}

impl BridgeConfig {
    /// Load a [BridgeConfig] from a YAML file, falling back to defaults for
    /// any field the file omits.
    pub fn from_yaml_file(path: &str) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Full path to the process discovery file.
    pub fn process_file_path(&self) -> String {
        format!("{}/{}", self.bridge_dir, self.process_file)
    }

    /// Full path the shared library should be staged at.
    pub fn staged_library_path(&self) -> String {
        format!("{}/{}", self.bridge_dir, self.staged_library)
    }
}
