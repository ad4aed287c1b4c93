//! The HID Function: the stateful gadget endpoint that owns the three DS3
//! report buffers and answers GET_REPORT/SET_REPORT. Everything here is
//! synchronous buffer logic; the surrounding async sampler/epOut loop
//! lives in [crate::bridge::Bridge], which is the sole caller of these
//! methods (see `DESIGN.md` for why the gadget itself is owned by the
//! Bridge rather than by this struct).
#[cfg(test)]
#[path = "hid_function_test.rs"]
mod hid_function_test;

use crate::error::BridgeError;
use crate::report::{FeatureReport, InputReport, OutputReport};

/// Which of the three HID report kinds a GET_REPORT/SET_REPORT control
/// transfer addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Input,
    Output,
    Feature,
}

/// Owns the DS3's input, output, and feature report state. External
/// components (the Bridge, the TCP Session) only ever reach these buffers
/// through the methods below.
#[derive(Debug, Default)]
pub struct HidFunction {
    input: InputReport,
    output: OutputReport,
    features: FeatureReport,
}

impl HidFunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once SET 0xF4 has put the controller into an input-streaming
    /// mode; the epIn sampler only writes frames while this holds.
    pub fn input_streaming_enabled(&self) -> bool {
        self.features.input_streaming_enabled()
    }

    /// Snapshot of the 49-byte input report, as written to `epIn` on each
    /// sampler tick.
    pub fn input_bytes(&self) -> [u8; crate::report::input::LEN] {
        self.input.bytes
    }

    /// Snapshot of the 48-byte output report, as mirrored to the TCP client
    /// on each sampler tick.
    pub fn output_bytes(&self) -> [u8; crate::report::output::LEN] {
        self.output.bytes
    }

    /// Apply a 48-byte TCP-delivered input frame (the opcode byte doubling
    /// as report ID 0x01). Frames land in receive order; only the latest
    /// value between sampler ticks is surfaced. Byte 48 of the in-memory
    /// report, which no wire frame carries, is left untouched.
    pub fn apply_input_frame(&mut self, frame: &[u8; crate::report::input::WIRE_LEN]) {
        self.input.apply_frame(frame);
    }

    /// Feed a raw frame read from `epOut`. Matches `[0x01, ...rest]` with
    /// `rest.len() == 48`; any other shape is dropped (the caller logs it).
    pub fn handle_ep_out_frame(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        if frame.len() != 1 + crate::report::output::LEN || frame[0] != 0x01 {
            return Err(BridgeError::ProtocolError(format!(
                "dropped malformed epOut frame of length {}",
                frame.len()
            )));
        }
        self.output.update(&frame[1..])
    }

    /// Dispatch a GET_REPORT(kind, id) control transfer.
    pub fn on_get_report(&self, kind: ReportKind, id: u8) -> Result<Vec<u8>, BridgeError> {
        match kind {
            ReportKind::Input if id == 0x01 => Ok(self.input.bytes.to_vec()),
            ReportKind::Output if id == 0x01 => Ok(self.output.bytes.to_vec()),
            ReportKind::Feature => self.features.get(id).map(|r| r.to_vec()),
            _ => Err(BridgeError::UnsupportedReport {
                report_type: report_type_tag(kind),
                report_id: id,
            }),
        }
    }

    /// Dispatch a SET_REPORT(kind, id, data) control transfer.
    pub fn on_set_report(
        &mut self,
        kind: ReportKind,
        id: u8,
        data: &[u8],
    ) -> Result<(), BridgeError> {
        match kind {
            ReportKind::Output if id == 0x01 => self.output.update(data),
            ReportKind::Feature => self.features.set(id, data),
            _ => Err(BridgeError::UnsupportedReport {
                report_type: report_type_tag(kind),
                report_id: id,
            }),
        }
    }
}

fn report_type_tag(kind: ReportKind) -> u8 {
    match kind {
        ReportKind::Input => 0x01,
        ReportKind::Output => 0x02,
        ReportKind::Feature => 0x03,
    }
}
