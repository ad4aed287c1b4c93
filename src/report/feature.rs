//! Feature reports: bidirectional configuration, each exactly 64 bytes on
//! the wire, plus the flash-memory access state machine (F1) and the
//! controller-control state machine (F4) that back them.
#[cfg(test)]
#[path = "feature_test.rs"]
mod feature_test;

use crate::error::BridgeError;
use crate::report::flash;

pub const LEN: usize = 64;

pub const REPORT_CONTROLLER_INFO: u8 = 0x01;
pub const REPORT_FLASH_ACCESS: u8 = 0xF1;
pub const REPORT_DEVICE_INFO: u8 = 0xF2;
pub const REPORT_PAIRING_INFO: u8 = 0xF5;
pub const REPORT_EXTENDED_SENSOR_CONFIG: u8 = 0xEF;
pub const REPORT_SENSOR_CONFIG: u8 = 0xF7;
pub const REPORT_SENSOR_STATUS: u8 = 0xF8;

const FLASH_SUBCOMMAND_SET_ADDRESS: u8 = 0x0B;
const FLASH_SUBCOMMAND_WRITE: u8 = 0x0A;

const CONTROL_PREFIX: u8 = 0x42;
const CONTROL_DISABLE_STREAMING: u8 = 0x01;
const CONTROL_ENABLE_STREAMING: u8 = 0x02;
const CONTROL_ENABLE_MOTION: u8 = 0x03;
const CONTROL_RESTART: u8 = 0x04;
const CONTROL_SHUTDOWN: u8 = 0x0B;
const CONTROL_STARTUP: u8 = 0x0C;

/// The "feature type" used only to tag [BridgeError::UnsupportedReport];
/// this is not a wire byte, as feature reports are self-identifying by id.
pub const HID_REPORT_TYPE_FEATURE: u8 = 0x03;

/// Bidirectional DS3 configuration state: the two flash banks, the F4
/// control state, pairing/device identity, and the flash address pointer.
#[derive(Debug, Clone)]
pub struct FeatureReport {
    flash: [[u8; flash::BANK_SIZE]; 2],
    /// Runtime control state written by SET 0xF4/0xEF. `state[1]` is the
    /// input-streaming mode.
    state: [u8; 4],
    pub device_mac: [u8; 6],
    pub paired_mac: [u8; 6],
    pub serial: u32,
    pub pcb_revision: u8,
    flash_bank: u8,
    flash_addr: u8,
}

impl Default for FeatureReport {
    fn default() -> Self {
        Self {
            flash: [flash::bank_a(), flash::bank_b()],
            state: [0; 4],
            device_mac: [0x00, 0x19, 0xC5, 0x12, 0x34, 0x56],
            paired_mac: [0; 6],
            serial: 0,
            pcb_revision: 0x01,
            flash_bank: 0,
            flash_addr: 0,
        }
    }
}

impl FeatureReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the controller control state machine has been told to
    /// stream input reports (F4 sub-commands 0x02/0x0C).
    pub fn input_streaming_enabled(&self) -> bool {
        self.state[1] == 0x01
    }

    pub fn flash_bank(&self) -> u8 {
        self.flash_bank & 0x01
    }

    pub fn flash_addr(&self) -> u8 {
        self.flash_addr
    }

    /// Dispatch a GET_REPORT(Feature, id) request.
    pub fn get(&self, id: u8) -> Result<[u8; LEN], BridgeError> {
        match id {
            REPORT_CONTROLLER_INFO => Ok(self.get_controller_info()),
            REPORT_FLASH_ACCESS => Ok(self.get_flash_read()),
            REPORT_DEVICE_INFO => Ok(self.get_device_info()),
            REPORT_PAIRING_INFO => Ok(self.get_pairing_info()),
            REPORT_EXTENDED_SENSOR_CONFIG => Ok(self.get_extended_sensor_config()),
            REPORT_SENSOR_CONFIG => Ok(self.get_sensor_config()),
            REPORT_SENSOR_STATUS => Ok(self.get_sensor_status()),
            _ => Err(BridgeError::UnsupportedReport {
                report_type: HID_REPORT_TYPE_FEATURE,
                report_id: id,
            }),
        }
    }

    /// Dispatch a SET_REPORT(Feature, id, data) request.
    pub fn set(&mut self, id: u8, data: &[u8]) -> Result<(), BridgeError> {
        match id {
            REPORT_FLASH_ACCESS => self.set_flash_access(data),
            REPORT_PAIRING_INFO => self.set_pairing_info(data),
            REPORT_EXTENDED_SENSOR_CONFIG => self.set_extended_sensor_config(data),
            0xF4 => self.set_control(data),
            _ => Err(BridgeError::UnsupportedReport {
                report_type: HID_REPORT_TYPE_FEATURE,
                report_id: id,
            }),
        }
    }

    fn bank(&self) -> &[u8; flash::BANK_SIZE] {
        &self.flash[self.flash_bank() as usize]
    }

    fn get_controller_info(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        let bank_a = &self.flash[0];
        r[0] = 0x00;
        r[1] = 0x01;
        r[2..6].copy_from_slice(&bank_a[1..5]);
        // Destination is 38 bytes (6..44); the source range named in the
        // spec (0x60..0x8C, 44 bytes) does not fit it. Truncated to the
        // destination's length, the same resolution applied in
        // get_device_info/get_pairing_info; see DESIGN.md.
        r[6..44].copy_from_slice(&bank_a[0x60..0x60 + 38]);
        r
    }

    fn get_flash_read(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        r[0..5].copy_from_slice(&[0x57, 0x01, 0xFF, 0xFF, 0x10]);
        let addr = (self.flash_addr & 0xF0) as usize;
        let bank = self.bank();
        for i in 0..16 {
            r[5 + i] = bank[(addr + i) % flash::BANK_SIZE];
        }
        r
    }

    fn get_device_info(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        r[0..4].copy_from_slice(&[0xF2, 0xFF, 0xFF, 0x00]);
        let mut mac = self.device_mac;
        mac.reverse();
        r[4..10].copy_from_slice(&mac);
        r[10] = 0x00;
        r[11] = 0x03;
        r[12..16].copy_from_slice(&self.serial.to_le_bytes());
        r[16] = self.pcb_revision;
        // Destination is 19 bytes (17..36); the source range named in the
        // spec (0x6C..0x8B, 31 bytes) does not fit it. Truncated to the
        // destination length; see DESIGN.md.
        let bank_a = &self.flash[0];
        r[17..36].copy_from_slice(&bank_a[0x6C..0x6C + 19]);
        r
    }

    fn get_pairing_info(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        r[0..2].copy_from_slice(&[0x01, 0x00]);
        r[2..8].copy_from_slice(&self.paired_mac);
        let mut mac_head = [self.device_mac[0], self.device_mac[1]];
        mac_head.reverse();
        r[8..10].copy_from_slice(&mac_head);
        r[10] = 0x00;
        r[11] = 0x03;
        r[12..16].copy_from_slice(&self.serial.to_le_bytes());
        r[16] = self.pcb_revision;
        let bank_a = &self.flash[0];
        r[17..36].copy_from_slice(&bank_a[0x6C..0x6C + 19]);
        r
    }

    fn get_extended_sensor_config(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        let a = self.state[2] as usize;
        r[1] = 0xEF;
        r[2..6].copy_from_slice(&self.flash[0][1..5]);
        r[5..9].copy_from_slice(&self.state);
        let bank_b = &self.flash[1];
        for i in 0..16 {
            r[0x11 + i] = bank_b[(a + i) % flash::BANK_SIZE];
        }
        r[0x30] = 0x05;
        r
    }

    fn get_sensor_config(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        r[0x07] = 0xFF;
        r[0x11..0x25].copy_from_slice(&self.flash[0][0x8C..0xA0]);
        r[0x30] = 0x05;
        r
    }

    fn get_sensor_status(&self) -> [u8; LEN] {
        let mut r = [0u8; LEN];
        r[0..5].copy_from_slice(&[0x00, 0x01, 0x00, 0x00, self.flash[0][3]]);
        r[5..9].copy_from_slice(&self.state);
        let a = self.state[2] as usize;
        let bank_b = &self.flash[1];
        for i in 0..16 {
            r[0x11 + i] = bank_b[(a + i) % flash::BANK_SIZE];
        }
        r[0x30] = 0x05;
        r
    }

    fn set_flash_access(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        let sub_command = data.get(1).copied().ok_or_else(|| {
            BridgeError::ProtocolError("F1 SET payload shorter than 2 bytes".to_string())
        })?;
        match sub_command {
            FLASH_SUBCOMMAND_SET_ADDRESS => {
                self.flash_bank = data.get(4).copied().unwrap_or(0) & 0x01;
                self.flash_addr = data.get(5).copied().unwrap_or(0);
                Ok(())
            }
            FLASH_SUBCOMMAND_WRITE => {
                let payload = &data[7.min(data.len())..];
                let bank = self.flash_bank() as usize;
                let addr = self.flash_addr as usize;
                for (i, byte) in payload.iter().enumerate() {
                    self.flash[bank][(addr + i) % flash::BANK_SIZE] = *byte;
                }
                Ok(())
            }
            other => Err(BridgeError::ProtocolError(format!(
                "unrecognized flash sub-command {other:#x}"
            ))),
        }
    }

    fn set_pairing_info(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        if data.len() < 8 {
            return Err(BridgeError::ProtocolError(
                "F5 SET payload shorter than 8 bytes".to_string(),
            ));
        }
        self.paired_mac.copy_from_slice(&data[2..8]);
        Ok(())
    }

    fn set_extended_sensor_config(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        if data.len() < 8 {
            return Err(BridgeError::ProtocolError(
                "EF SET payload shorter than 8 bytes".to_string(),
            ));
        }
        self.state.copy_from_slice(&data[4..8]);
        Ok(())
    }

    fn set_control(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        let sub_command = data.get(1).copied().ok_or_else(|| {
            BridgeError::ProtocolError("F4 SET payload shorter than 2 bytes".to_string())
        })?;
        match sub_command {
            CONTROL_DISABLE_STREAMING => {
                self.state[1] = 0x00;
                Ok(())
            }
            CONTROL_ENABLE_STREAMING => {
                self.state[1] = 0x01;
                Ok(())
            }
            CONTROL_ENABLE_MOTION => {
                self.state[1] = 0x03;
                Ok(())
            }
            CONTROL_RESTART | CONTROL_SHUTDOWN => {
                self.state = [0; 4];
                self.flash_bank = 0;
                self.flash_addr = 0;
                Ok(())
            }
            CONTROL_STARTUP => {
                self.state[1] = 0x01;
                Ok(())
            }
            other => {
                let prefix = data.first().copied().unwrap_or(0);
                Err(BridgeError::ProtocolError(format!(
                    "unrecognized F4 control sub-command {other:#x} (prefix {prefix:#x}, expected {CONTROL_PREFIX:#x})"
                )))
            }
        }
    }
}
