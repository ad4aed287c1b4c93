use super::*;

#[test]
fn defaults_match_external_interface_literals() {
    let config = BridgeConfig::default();
    assert_eq!(config.bridge_dir, "/data/local/tmp/ds3_bridge");
    assert_eq!(
        config.process_file_path(),
        "/data/local/tmp/ds3_bridge/process.txt"
    );
    assert_eq!(
        config.staged_library_path(),
        "/data/local/tmp/ds3_bridge/libaio.so"
    );
    assert_eq!(config.gadget.vendor_id, 0x054C);
    assert_eq!(config.gadget.product_id, 0x0268);
    assert_eq!(config.sampler_interval_ms, 10);
}

#[test]
fn from_yaml_overrides_only_given_fields() {
    let yaml = "bridge_dir: /tmp/custom\nprocess_file: proc.txt\nstaged_library: libaio.so\n";
    let path = std::env::temp_dir().join("ds3_bridge_config_test.yaml");
    std::fs::write(&path, yaml).unwrap();

    let config = BridgeConfig::from_yaml_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.bridge_dir, "/tmp/custom");
    assert_eq!(config.sampler_interval_ms, 10);

    std::fs::remove_file(&path).ok();
}
