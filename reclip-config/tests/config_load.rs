use reclip_config::{ReclipConfigLoader, SinkConfig};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn loads_cloud_config_with_env_expansion() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
social:
  bearer_token: "${RECLIP_TEST_BEARER}"
storage:
  access_token: "${RECLIP_TEST_STORAGE_TOKEN}"
poll:
  interval_secs: 5
  max_mention_age_secs: 20
"#;
    let p = write_yaml(&tmp, "reclip.yaml", file_yaml);

    temp_env::with_vars(
        [
            ("RECLIP_TEST_BEARER", Some("bearer-abc")),
            ("RECLIP_TEST_STORAGE_TOKEN", Some("sl.xyz")),
        ],
        || {
            let config = ReclipConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load bot config");

            assert_eq!(config.social.bearer_token, "bearer-abc");
            let storage = config.storage.expect("storage section");
            assert_eq!(storage.access_token, "sl.xyz");
            assert_eq!(storage.folder, "/destination");
            assert_eq!(config.poll.interval_secs, 5);
            assert_eq!(config.poll.max_mention_age_secs, 20);
            // untouched sections keep their defaults
            assert_eq!(config.poll.batch_size, 10);
            assert_eq!(config.retention.window_mins, 60);
            assert_eq!(config.retention.reference_zone, "America/Argentina/Buenos_Aires");
            assert!(matches!(config.sink, SinkConfig::Cloud));
        },
    );
}

#[test]
#[serial]
fn local_sink_needs_no_storage_credentials() {
    let config = ReclipConfigLoader::new()
        .with_yaml_str(
            r#"
social:
  bearer_token: "bearer-abc"
sink:
  kind: local
  path: "/tmp/reclip-media"
"#,
        )
        .load()
        .expect("local sink config");

    match config.sink {
        SinkConfig::Local { ref path } => assert_eq!(path, "/tmp/reclip-media"),
        _ => panic!("expected local sink"),
    }
    assert!(config.storage.is_none());
}

#[test]
#[serial]
fn cloud_sink_without_storage_is_a_load_error() {
    let err = ReclipConfigLoader::new()
        .with_yaml_str(
            r#"
social:
  bearer_token: "bearer-abc"
"#,
        )
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("storage"));
}

#[test]
#[serial]
fn missing_bearer_token_is_a_load_error() {
    let result = ReclipConfigLoader::new()
        .with_yaml_str(
            r#"
social:
  api_base: "https://api.example.com"
sink:
  kind: local
  path: "/tmp/reclip-media"
"#,
        )
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn bogus_reference_zone_is_rejected() {
    let err = ReclipConfigLoader::new()
        .with_yaml_str(
            r#"
social:
  bearer_token: "bearer-abc"
sink:
  kind: local
  path: "/tmp/reclip-media"
retention:
  reference_zone: "Mars/Olympus_Mons"
"#,
        )
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("reference_zone"));
}
