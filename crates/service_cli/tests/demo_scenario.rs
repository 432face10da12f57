//! Runs the `note` binary against the bundled phoenix demo scenario.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;

fn demo_scenario() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demo/notes/phoenix_autocall.toml")
}

fn note(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_note"))
        .arg("--scenario")
        .arg(demo_scenario())
        .args(["--format", "json"])
        .args(args)
        .env_remove("NOTE_LOG_LEVEL")
        .env_remove("NOTE_OUTPUT_FORMAT")
        .env_remove("NOTE_REQUIRE_FINAL")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run note")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "note failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn amounts(payouts: &Value) -> Vec<(String, u64)> {
    payouts
        .as_array()
        .expect("payouts array")
        .iter()
        .map(|p| {
            (
                p["kind"].as_str().unwrap().to_string(),
                p["amount"].as_u64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_payout_replays_memory_coupon_and_put() {
    let report = json_stdout(&note(&["payout", "-i", "phoenix", "-a", "10"]));

    assert_eq!(report["settlement_amount"].as_u64(), Some(10_000_000));
    // 2026-05-01, no autocall
    assert_eq!(report["termination"].as_u64(), Some(1_777_593_600));
    assert_eq!(
        amounts(&report["payouts"]),
        vec![
            ("coupon".to_string(), 60_000_000),
            ("option".to_string(), 450_000_000)
        ]
    );
}

#[test]
fn test_settle_reports_burn_and_credits() {
    let report = json_stdout(&note(&[
        "settle",
        "-i",
        "protected",
        "--account",
        "alice",
        "-a",
        "10",
    ]));

    assert_eq!(report["account"], "alice");
    assert_eq!(report["burned"].as_u64(), Some(10_000_000));
    assert_eq!(
        amounts(&report["payouts"]),
        vec![("coupon".to_string(), 50_000_000)]
    );

    let credits = report["credits"].as_array().unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0]["engine_id"].as_u64(), Some(0));
    assert_eq!(credits[0]["target"]["collateral"].as_u64(), Some(2));
    assert_eq!(credits[0]["amount"].as_u64(), Some(50_000_000));
}

#[test]
fn test_unknown_instrument_fails() {
    let output = note(&["payout", "-i", "nonexistent", "-a", "1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nonexistent"));
}
