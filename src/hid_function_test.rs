use super::*;

#[test]
fn apply_input_frame_overwrites_bytes_0_through_47_only() {
    let mut hid = HidFunction::new();
    let original = hid.input_bytes();
    let frame = [0xAAu8; crate::report::input::WIRE_LEN];
    hid.apply_input_frame(&frame);
    assert_eq!(&hid.input_bytes()[..crate::report::input::WIRE_LEN], &frame[..]);
    assert_eq!(
        hid.input_bytes()[crate::report::input::LEN - 1],
        original[crate::report::input::LEN - 1]
    );
}

#[test]
fn handle_ep_out_frame_updates_output_on_matching_shape() {
    let mut hid = HidFunction::new();
    let mut frame = vec![0x01u8];
    frame.extend_from_slice(&[0x07u8; crate::report::output::LEN]);
    hid.handle_ep_out_frame(&frame).unwrap();
    assert_eq!(hid.output_bytes(), [0x07u8; crate::report::output::LEN]);
}

#[test]
fn handle_ep_out_frame_drops_wrong_opcode() {
    let mut hid = HidFunction::new();
    let mut frame = vec![0x02u8];
    frame.extend_from_slice(&[0x07u8; crate::report::output::LEN]);
    assert!(hid.handle_ep_out_frame(&frame).is_err());
    assert_eq!(hid.output_bytes(), [0u8; crate::report::output::LEN]);
}

#[test]
fn handle_ep_out_frame_drops_wrong_length() {
    let mut hid = HidFunction::new();
    let frame = vec![0x01u8, 0x02, 0x03];
    assert!(hid.handle_ep_out_frame(&frame).is_err());
}

#[test]
fn input_streaming_enabled_tracks_f4_control_state() {
    let mut hid = HidFunction::new();
    assert!(!hid.input_streaming_enabled());
    hid.on_set_report(ReportKind::Feature, 0xF4, &[0x42, 0x02])
        .unwrap();
    assert!(hid.input_streaming_enabled());
}

#[test]
fn get_and_set_output_report_round_trip_through_control_transfer() {
    let mut hid = HidFunction::new();
    let payload = [0x09u8; crate::report::output::LEN];
    hid.on_set_report(ReportKind::Output, 0x01, &payload)
        .unwrap();
    assert_eq!(
        hid.on_get_report(ReportKind::Output, 0x01).unwrap(),
        payload.to_vec()
    );
}

#[test]
fn get_input_report_returns_the_current_snapshot() {
    let mut hid = HidFunction::new();
    let frame = [0x5Bu8; crate::report::input::WIRE_LEN];
    hid.apply_input_frame(&frame);
    let snapshot = hid.on_get_report(ReportKind::Input, 0x01).unwrap();
    assert_eq!(&snapshot[..crate::report::input::WIRE_LEN], &frame[..]);
}

#[test]
fn get_feature_report_dispatches_by_id() {
    let hid = HidFunction::new();
    let report = hid.on_get_report(ReportKind::Feature, 0x01).unwrap();
    assert_eq!(report.len(), crate::report::feature::LEN);
}

#[test]
fn unsupported_get_report_combination_is_an_error() {
    let hid = HidFunction::new();
    let err = hid.on_get_report(ReportKind::Input, 0x02).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::UnsupportedReport {
            report_type: 0x01,
            report_id: 0x02
        }
    ));
}

#[test]
fn unsupported_set_report_combination_is_an_error() {
    let mut hid = HidFunction::new();
    let err = hid
        .on_set_report(ReportKind::Input, 0x01, &[])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedReport { .. }));
}
