//! Integration tests that run the CLI binary.

use tempfile::TempDir;

fn bin(data_dir: &TempDir) -> std::process::Command {
    // CARGO_BIN_EXE_<name> uses the binary target name; hyphens require concat! for env!()
    let bin = env!(concat!("CARGO_BIN_EXE_relay", "-", "chat"));
    let mut cmd = std::process::Command::new(bin);
    cmd.env_remove("RELAY_WEBHOOK_BASE")
        .env("RELAY_CHAT_DATA_DIR", data_dir.path())
        // Run from temp dir so dotenv() won't load .env from project root
        .current_dir(data_dir.path());
    cmd
}

#[test]
fn cli_help_succeeds_and_outputs_usage() {
    let tmp = TempDir::new().expect("temp dir");
    let output = bin(&tmp)
        .arg("--help")
        .output()
        .expect("binary not found - run cargo build first");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("relay-chat") && stdout.contains("inspect"),
        "expected usage text in output"
    );
}

#[test]
fn cli_version_succeeds() {
    let tmp = TempDir::new().expect("temp dir");
    let output = bin(&tmp)
        .arg("--version")
        .output()
        .expect("binary not found - run cargo build first");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("relay-chat"));
}

#[test]
fn cli_prompt_without_webhook_base_exits_with_error() {
    let tmp = TempDir::new().expect("temp dir");
    let output = bin(&tmp)
        .arg("-p")
        .arg("hello")
        .output()
        .expect("binary not found - run cargo build first");

    assert!(
        !output.status.success(),
        "expected failure when RELAY_WEBHOOK_BASE is not set"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("RELAY_WEBHOOK_BASE"),
        "expected config error message, got: {}",
        stderr
    );
}

#[test]
fn cli_inspect_runs_body_through_pipeline() {
    let tmp = TempDir::new().expect("temp dir");
    let output = bin(&tmp)
        .arg("inspect")
        .arg(r#"{"success":true,"message":"Hello there"}"#)
        .output()
        .expect("binary not found - run cargo build first");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Counts quota:   yes"), "got: {}", stdout);
    assert!(stdout.contains("Hello there"), "got: {}", stdout);
}

#[test]
fn cli_status_works_offline_when_signed_out() {
    let tmp = TempDir::new().expect("temp dir");
    let output = bin(&tmp)
        .arg("status")
        .output()
        .expect("binary not found - run cargo build first");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("not signed in"));
}

#[test]
fn cli_theme_persists_between_runs() {
    let tmp = TempDir::new().expect("temp dir");
    let set = bin(&tmp)
        .args(["theme", "light"])
        .output()
        .expect("binary not found - run cargo build first");
    assert!(set.status.success());

    let show = bin(&tmp)
        .arg("theme")
        .output()
        .expect("binary not found - run cargo build first");
    assert!(String::from_utf8_lossy(&show.stdout).contains("light"));
}
