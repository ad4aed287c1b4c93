use std::time::Duration;

use super::*;
use crate::config::BridgeConfig;
use crate::report::descriptor::REPORT_DESCRIPTOR;

#[tokio::test]
async fn bind_records_descriptor_and_sets_bound() {
    let mut gadget = Gadget::Mock(MockGadget::new());
    let config = BridgeConfig::default();
    gadget
        .bind(&REPORT_DESCRIPTOR, &config, Duration::from_secs(1))
        .await
        .unwrap();

    let Gadget::Mock(mock) = &gadget else {
        unreachable!()
    };
    assert!(mock.bound);
    assert_eq!(mock.last_descriptor, Some(&REPORT_DESCRIPTOR[..]));
}

#[tokio::test]
async fn write_then_unbind_is_idempotent() {
    let mut gadget = Gadget::Mock(MockGadget::new());
    gadget.write_ep_in(&[1, 2, 3]).await.unwrap();
    gadget.unbind().await.unwrap();
    gadget.unbind().await.unwrap();

    let Gadget::Mock(mock) = &gadget else {
        unreachable!()
    };
    assert_eq!(mock.written_to_ep_in, vec![vec![1, 2, 3]]);
    assert!(!mock.bound);
}

#[tokio::test]
async fn read_ep_out_drains_the_queue_in_order() {
    let mut mock = MockGadget::new();
    mock.ep_out_queue.push_back(vec![1, 2, 3]);
    mock.ep_out_queue.push_back(vec![4, 5, 6]);
    let mut gadget = Gadget::Mock(mock);

    assert_eq!(gadget.read_ep_out().await.unwrap(), vec![1, 2, 3]);
    assert_eq!(gadget.read_ep_out().await.unwrap(), vec![4, 5, 6]);
}

#[tokio::test]
async fn read_ep_out_blocks_instead_of_erroring_once_drained() {
    let mut gadget = Gadget::Mock(MockGadget::new());
    let result = tokio::time::timeout(Duration::from_millis(20), gadget.read_ep_out()).await;
    assert!(result.is_err(), "expected read_ep_out to never resolve");
}

#[tokio::test]
async fn read_ep_out_honors_a_scripted_failure() {
    let mut mock = MockGadget::new();
    mock.fail_next_read = Some("simulated fault".to_string());
    let mut gadget = Gadget::Mock(mock);
    assert!(gadget.read_ep_out().await.is_err());
}
