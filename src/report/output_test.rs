use super::*;

#[test]
fn update_rejects_wrong_length() {
    let mut report = OutputReport::default();
    let err = report.update(&[0u8; 47]).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidLength(47)));
    // State is untouched.
    assert_eq!(report.bytes, [0u8; LEN]);
}

#[test]
fn update_accepts_exactly_48_bytes() {
    let mut report = OutputReport::default();
    let mut payload = [0u8; LEN];
    payload[1] = 10;
    payload[2] = 200;
    report.update(&payload).unwrap();
    assert_eq!(report.bytes, payload);
}

#[test]
fn motor_active_requires_both_duration_and_power() {
    let mut report = OutputReport::default();
    let mut payload = [0u8; LEN];
    payload[1] = 10;
    payload[2] = 0;
    report.update(&payload).unwrap();
    assert!(!report.is_right_motor_active());

    payload[2] = 200;
    report.update(&payload).unwrap();
    assert!(report.is_right_motor_active());
    assert!(!report.is_left_motor_active());
}

#[test]
fn led_mask_and_states_extract_bits_1_through_4() {
    let mut report = OutputReport::default();
    let mut payload = [0u8; LEN];
    // mask = 0b1010 in bits 1..5 of byte 9 -> byte value = 0b00010100 = 0x14
    payload[9] = 0b0001_0100;
    report.update(&payload).unwrap();
    assert_eq!(report.led_mask(), 0b1010);
    assert_eq!(report.led_states(), [false, true, false, true]);
}
