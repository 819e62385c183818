#![allow(clippy::unwrap_used)]
// File-level tests for manifest loading and state persistence.

use std::io::Write;

use serde_json::json;

use bmcsync_config::{ConfigError, Manifest, ResourceKind, State};

fn manifest_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Manifest ────────────────────────────────────────────────────────

#[test]
fn test_load_valid_manifest() {
    let file = manifest_file(
        r#"
        [[power]]
        name = "rack1-node1"
        desired_power_state = "On"
        endpoint = { address = "10.0.0.5", user = "root", password = "calvin" }

        [[bios]]
        name = "rack1-node1"
        endpoint = { address = "10.0.0.5", ssl_insecure = true }
        attributes = { BootMode = "Uefi", LogicalProc = "Enabled" }
        "#,
    );

    let manifest = Manifest::load(file.path()).unwrap();

    assert_eq!(manifest.power[0].name, "rack1-node1");
    assert_eq!(manifest.bios[0].attributes.len(), 2);
    assert!(!manifest.bios[0].apply);
    assert!(!manifest.is_empty());
}

#[test]
fn test_syntax_error_names_the_file() {
    let file = manifest_file("[[power]\nname = ");

    let err = Manifest::load(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_non_string_attribute_is_rejected() {
    let file = manifest_file(
        r#"
        [[bios]]
        name = "node1"
        endpoint = { address = "10.0.0.5" }
        attributes = { NumCores = 8 }
        "#,
    );

    assert!(matches!(
        Manifest::load(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_missing_manifest_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Manifest::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

// ── State ───────────────────────────────────────────────────────────

#[test]
fn test_state_round_trip_through_disk_prunes_removed_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bmcsync.state.json");

    let mut state = State::default();
    state.record(
        ResourceKind::Power.key("gone"),
        "10.0.0.9/redfish/v1/Systems/1",
        json!({ "power_state": "Off" }),
    );
    state.record(
        ResourceKind::Bios.key("node1"),
        "10.0.0.5/redfish/v1/Systems/1/Bios",
        json!({ "odata_id": "/redfish/v1/Systems/1/Bios", "id": "Bios" }),
    );
    state.save(&path).unwrap();

    let manifest: Manifest = toml::from_str(
        r#"
        [[bios]]
        name = "node1"
        endpoint = { address = "10.0.0.5" }
        "#,
    )
    .unwrap();

    let mut reloaded = State::load(&path).unwrap();
    let removed = reloaded.prune(&manifest.keys());
    reloaded.save(&path).unwrap();

    assert_eq!(removed, vec!["power.gone".to_owned()]);
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["version"], json!(1));
    assert!(on_disk["resources"]["bios.node1"]["updated_at"].is_string());
    assert!(on_disk["resources"].get("power.gone").is_none());
}
