use super::*;

#[test]
fn descriptor_declares_report_ids_1_2_ee_ef() {
    let bytes = REPORT_DESCRIPTOR;
    let has_id = |id: u8| bytes.windows(2).any(|w| w == [0x85, id]);
    assert!(has_id(0x01));
    assert!(has_id(0x02));
    assert!(has_id(0xEE));
    assert!(has_id(0xEF));
}
