// Mounting a builder from RULEBUILDER_* environment variables.
use std::fs;

use rulebuilder::{mount_from_env, Area, BlockTemplate, Rule};
use tempfile::tempdir;

#[test]
fn mounts_with_configured_fields() {
    let dir = tempdir().expect("temp dir");
    let fields = dir.path().join("fields.json");
    fs::write(
        &fields,
        r#"{"fields": [{"name": "queue_depth", "label": "Queue depth"}]}"#,
    )
    .expect("write catalog");

    std::env::set_var("RULEBUILDER_MOUNT", "#alerts");
    std::env::set_var("RULEBUILDER_FIELDS", &fields);

    let mut builder = mount_from_env(|_: &Rule| {}).expect("builder mounts");
    assert_eq!(builder.visual().mount(), "#alerts");
    assert_eq!(builder.catalog().names(), vec!["queue_depth"]);

    builder.add_block(BlockTemplate::Condition);
    let condition = builder
        .visual()
        .block_at(Area::Conditions, &[0])
        .and_then(|id| builder.visual().get(id))
        .expect("condition rendered");
    assert_eq!(
        condition.options(rulebuilder::Control::Field),
        Some(&["".to_string(), "queue_depth".to_string()][..])
    );

    std::env::set_var("RULEBUILDER_FIELDS", dir.path().join("missing.yaml"));
    assert!(mount_from_env(|_: &Rule| {}).is_err());
}
