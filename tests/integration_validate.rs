//! Integration tests for the --validate CLI mode.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Once;

static BUILD_ONCE: Once = Once::new();

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn skysentry_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("debug")
        .join("skysentry")
}

/// Build the binary once for all tests.
fn ensure_binary_built() {
    BUILD_ONCE.call_once(|| {
        let status = Command::new("cargo")
            .args(["build", "--bin", "skysentry"])
            .status()
            .expect("Failed to build skysentry");
        assert!(status.success(), "Failed to build skysentry");
    });
}

#[test]
fn validate_valid_config_exits_success() {
    ensure_binary_built();

    let output = Command::new(skysentry_binary())
        .args(["--validate", "-c"])
        .arg(fixture_path("config_valid.yaml"))
        .output()
        .expect("Failed to run skysentry");

    assert!(
        output.status.success(),
        "skysentry --validate should exit with code 0 for valid config\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Configuration is valid"),
        "Output should indicate valid config: {}",
        stdout
    );
    assert!(
        stdout.contains("Provider URL"),
        "Output should show the provider URL: {}",
        stdout
    );
    assert!(
        stdout.contains("Notifiers:"),
        "Output should show notifier count: {}",
        stdout
    );
}

#[test]
fn validate_invalid_operator_exits_failure() {
    ensure_binary_built();

    let output = Command::new(skysentry_binary())
        .args(["--validate", "-c"])
        .arg(fixture_path("config_invalid_operator.yaml"))
        .output()
        .expect("Failed to run skysentry");

    assert!(
        !output.status.success(),
        "skysentry --validate should exit non-zero for invalid config"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid operator"),
        "stderr should name the invalid operator: {}",
        stderr
    );
}

#[test]
fn validate_missing_config_exits_failure() {
    ensure_binary_built();

    let output = Command::new(skysentry_binary())
        .args(["--validate", "-c", "/nonexistent/skysentry.yaml"])
        .output()
        .expect("Failed to run skysentry");

    assert!(
        !output.status.success(),
        "skysentry --validate should exit non-zero for a missing file"
    );
}
