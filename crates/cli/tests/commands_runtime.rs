use std::env;
use std::sync::{Mutex, OnceLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pengadaan_cli::commands::{config, fetch, status, token};
use serde_json::{json, Value};

#[test]
fn token_reports_role_and_effective_branch() {
    let raw = token_with(json!({
        "sub": "budi",
        "roles": "Staf Gudang Pelaksana Umum",
        "nomorCabang": 7,
    }));

    let result = token::run(&raw);
    assert_eq!(result.exit_code, 0, "expected decodable token to succeed");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "token");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["role"], "Staf Gudang Pelaksana Umum");
    assert_eq!(payload["data"]["branch_effective"], 7);
    assert_eq!(payload["data"]["valid"], true);
}

#[test]
fn token_without_branch_claim_falls_back_to_default() {
    let raw = token_with(json!({ "sub": "siti", "role": "Staf keuangan" }));

    let result = token::run(&raw);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["branch_claim"], Value::Null);
    assert_eq!(payload["data"]["branch_effective"], 1);
}

#[test]
fn token_rejects_undecodable_input() {
    let result = token::run("not-a-token");
    assert_eq!(result.exit_code, 2, "expected undecodable token failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "token");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "undecodable_token");
}

#[test]
fn token_flags_expired_credentials() {
    let raw = token_with(json!({
        "sub": "agus",
        "roles": "Kepala Operasional Cabang",
        "exp": 1,
    }));

    let result = token::run(&raw);
    assert_eq!(result.exit_code, 0, "expired tokens still decode");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["valid"], false);
    assert_eq!(payload["message"], "token decoded but expired");
}

#[test]
fn status_describes_rejected_step() {
    let result = status::run(0, false);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "status");
    assert_eq!(payload["data"]["label"], "Ditolak");
    assert_eq!(payload["data"]["color_class"], "bg-red-500");
    assert_eq!(payload["data"]["terminal"], true);
    assert_eq!(payload["data"]["acting_role"], Value::Null);
}

#[test]
fn status_partner_step_three_is_terminal_completion() {
    let result = status::run(3, true);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["label"], "Selesai");
    assert_eq!(payload["data"]["terminal"], true);
}

#[test]
fn status_partner_step_four_is_unknown() {
    let result = status::run(4, true);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["label"], "Status Tidak Diketahui");
    assert_eq!(payload["data"]["color_class"], "bg-gray-400");
    assert_eq!(payload["data"]["terminal"], false);
}

#[test]
fn status_names_acting_role_for_warehouse_step() {
    let result = status::run(3, false);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["acting_role"], "Staf Gudang Pelaksana Umum");
    assert_eq!(payload["data"]["terminal"], false);
}

#[test]
fn config_attributes_env_overrides() {
    with_env(&[("PENGADAAN_API_BASE_URL", "http://api.test")], || {
        let output = config::run();
        assert!(output.contains("effective config"), "missing header: {output}");
        assert!(
            output.contains("- api.base_url = http://api.test (source: env (PENGADAAN_API_BASE_URL))"),
            "missing env attribution: {output}"
        );
        assert!(output.contains("- api.domain = pengadaan-barang (source: default)"));
        assert!(output.contains("- workflow.default_branch = 1 (source: default)"));
    });
}

#[test]
fn config_reports_validation_failures() {
    with_env(&[("PENGADAAN_API_BASE_URL", "http://api.test/")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed:"), "unexpected output: {output}");
    });
}

#[test]
fn fetch_rejects_undecodable_token_before_any_request() {
    with_env(&[], || {
        let result = fetch::run(Some("PB-1"), None, "not-a-token");
        assert_eq!(result.exit_code, 2, "expected auth failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "fetch");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "auth");
    });
}

fn token_with(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PENGADAAN_API_BASE_URL",
        "PENGADAAN_API_DOMAIN",
        "PENGADAAN_DEFAULT_BRANCH",
        "PENGADAAN_LOG_LEVEL",
        "PENGADAAN_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
