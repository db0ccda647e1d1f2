//! Config error-message, atomic-write-safety, and init integration tests.
//! Storage: ~/.livedoc/config.yaml

use assert_fs::prelude::*;
use livedoc_core::{
    config::{self, DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS},
    ConfigError, Profile, TenantId, WatchEntry,
};
use predicates::prelude::predicate;
use std::fs;
use std::path::PathBuf;

fn acme() -> TenantId { TenantId::from("acme") }

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_mentions_init() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
    assert!(err.to_string().contains("livedoc init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".livedoc/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "must contain file path");
}

#[test]
fn unknown_profile_is_reported_by_name() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), Profile::http(DEFAULT_PROFILE, "http://x", acme())).expect("init");

    let err = config::profile_at(home.path(), "staging").unwrap_err();
    assert!(matches!(err, ConfigError::ProfileNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("staging"));
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), Profile::http(DEFAULT_PROFILE, "http://x", acme())).expect("init");

    let path = config::config_path_at(home.path());
    let original_bytes = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_file_name("config.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(original_bytes, fs::read(&path).expect("read after crash"));
    let loaded = config::load_at(home.path()).expect("original still loads");
    assert_eq!(loaded.profiles.len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Init and profile roundtrip
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::init_at(home.path(), Profile::local(DEFAULT_PROFILE, "/srv/livedoc", acme()))
        .expect("init");
    home.child(".livedoc/config.yaml").assert(predicate::path::exists());
    home.child(".livedoc/config.yaml")
        .assert(predicate::str::contains("local_dir: /srv/livedoc"));
}

#[test]
fn profile_roundtrip_keeps_watch_entries_and_client_tenant_names() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut profile = Profile::http("prod", "https://example.test/api/lms", TenantId::from("public"));
    profile.token_env = Some("LIVEDOC_TOKEN".to_string());
    profile.watch = vec![WatchEntry {
        tenant: acme(),
        draft: PathBuf::from("/work/acme.json"),
    }];
    config::init_at(home.path(), profile.clone()).expect("init");

    let yaml = fs::read_to_string(config::config_path_at(home.path())).expect("read");
    assert!(yaml.contains("tenant: vendor"), "stored tenant uses client alias: {yaml}");

    let loaded = config::profile_at(home.path(), "prod").expect("profile");
    assert_eq!(loaded, profile);
}

#[test]
fn missing_optional_fields_take_defaults() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".livedoc/config.yaml")
        .write_str(
            "version: 1\n\
             created_at: 2026-01-01T00:00:00Z\n\
             updated_at: 2026-01-01T00:00:00Z\n\
             profiles:\n  - name: default\n    base_url: http://localhost:3000/api/lms\n",
        )
        .expect("write");

    let profile = config::profile_at(home.path(), DEFAULT_PROFILE).expect("profile");
    assert_eq!(profile.tenant, TenantId::default());
    assert_eq!(profile.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert!(profile.watch.is_empty());
}

#[test]
fn init_rejects_profile_without_backend() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let mut profile = Profile::http(DEFAULT_PROFILE, "http://x", acme());
    profile.base_url = None;
    let err = config::init_at(home.path(), profile).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBackend { .. }));
    home.child(".livedoc/config.yaml").assert(predicate::path::missing());
}
