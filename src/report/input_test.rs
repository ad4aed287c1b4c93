use super::*;

#[test]
fn default_report_matches_fixed_layout_invariants() {
    let report = InputReport::default();
    assert_eq!(report.bytes[0], 0x01);
    assert_eq!(report.bytes[31], 0x05);
    assert_eq!(&report.bytes[6..10], &[127, 127, 127, 127]);
    assert_eq!(
        &report.bytes[41..47],
        &[0x01, 0xFF, 0x01, 0xFF, 0x01, 0xFF]
    );
}

#[test]
fn set_button_updates_bitfield_and_analog_byte_for_every_bit() {
    let buttons = [
        Button::Select,
        Button::L3,
        Button::R3,
        Button::Start,
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
        Button::L2,
        Button::R2,
        Button::L1,
        Button::R1,
        Button::Triangle,
        Button::Circle,
        Button::Cross,
        Button::Square,
        Button::Ps,
    ];

    for button in buttons {
        let mut report = InputReport::default();
        report.set_button(button, true, None);
        assert!(report.is_pressed(button));
        if let Some(offset) = button.analog_offset() {
            assert_eq!(report.bytes[offset], 255);
        }

        report.set_button(button, true, Some(42));
        if let Some(offset) = button.analog_offset() {
            assert_eq!(report.bytes[offset], 42);
        }

        report.set_button(button, false, None);
        assert!(!report.is_pressed(button));
        if let Some(offset) = button.analog_offset() {
            assert_eq!(report.bytes[offset], 0);
        }
    }
}

#[test]
fn set_button_does_not_disturb_other_bits() {
    let mut report = InputReport::default();
    report.set_button(Button::Start, true, None);
    report.set_button(Button::Cross, true, None);
    assert!(report.is_pressed(Button::Start));
    assert!(report.is_pressed(Button::Cross));
    assert!(!report.is_pressed(Button::Circle));

    report.set_button(Button::Start, false, None);
    assert!(!report.is_pressed(Button::Start));
    assert!(report.is_pressed(Button::Cross));
}

#[test]
fn bit_numbers_map_directly_into_bytes_2_through_4() {
    let mut report = InputReport::default();
    report.set_button(Button::Ps, true, None);
    // bit 16 -> byte 2 + 16/8 = byte 4, bit 0
    assert_eq!(report.bytes[4] & 0x01, 0x01);
}
