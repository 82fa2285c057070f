use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_defaults_when_nothing_set() {
    let cfg = ConsoleConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.token_type, "Bearer");
    assert_eq!(cfg.base_path, "/admin");
    assert_eq!(cfg.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
    assert!(!cfg.refresh_on_unauthorized);
    assert_eq!(cfg.storage_path, PathBuf::from(DEFAULT_STORAGE_FILE));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ConsoleConfig::from_lookup(lookup_from(&[
        ("PETADMIN_API_BASE_URL", "https://api.example.test/"),
        ("PETADMIN_TOKEN_TYPE", "JWT"),
        ("PETADMIN_STORAGE_PATH", "/tmp/session.json"),
        ("PETADMIN_BASE_PATH", "console/"),
        ("PETADMIN_REQUEST_TIMEOUT_SECS", "5"),
        ("PETADMIN_REFRESH_ON_401", "yes"),
        ("PETADMIN_PAGE_SIZE", "25"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_base_url, "https://api.example.test");
    assert_eq!(cfg.token_type, "JWT");
    assert_eq!(cfg.storage_path, PathBuf::from("/tmp/session.json"));
    assert_eq!(cfg.base_path, "/console");
    assert_eq!(cfg.request_timeout_secs, 5);
    assert!(cfg.refresh_on_unauthorized);
    assert_eq!(cfg.page_size, 25);
}

#[test]
fn from_lookup_storage_defaults_under_home() {
    let cfg = ConsoleConfig::from_lookup(lookup_from(&[("HOME", "/home/staff")])).unwrap();
    assert_eq!(cfg.storage_path, PathBuf::from("/home/staff/.petadmin/session.json"));
}

#[test]
fn from_lookup_rejects_bad_timeout() {
    let err = ConsoleConfig::from_lookup(lookup_from(&[("PETADMIN_REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidValue { var: "PETADMIN_REQUEST_TIMEOUT_SECS", value: "soon".to_owned() }
    );
}

#[test]
fn from_lookup_rejects_zero_page_size() {
    let err = ConsoleConfig::from_lookup(lookup_from(&[("PETADMIN_PAGE_SIZE", "0")])).unwrap_err();
    assert!(err.to_string().contains("PETADMIN_PAGE_SIZE"));
}

#[test]
fn from_lookup_rejects_bad_bool() {
    let err = ConsoleConfig::from_lookup(lookup_from(&[("PETADMIN_REFRESH_ON_401", "maybe")])).unwrap_err();
    assert!(err.to_string().contains("PETADMIN_REFRESH_ON_401"));
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let cfg = ConsoleConfig::from_lookup(lookup_from(&[("PETADMIN_TOKEN_TYPE", "   ")])).unwrap();
    assert_eq!(cfg.token_type, "Bearer");
}

#[test]
fn parse_bool_variants() {
    for val in ["1", "true", "YES", " on "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
    for val in ["0", "False", "no", "off"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
fn route_joins_under_base_path() {
    let cfg = ConsoleConfig::default();
    assert_eq!(cfg.route("/dashboard"), "/admin/dashboard");
    let root = ConsoleConfig { base_path: "/".to_owned(), ..ConsoleConfig::default() };
    assert_eq!(root.route("login"), "/login");
}
