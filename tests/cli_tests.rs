use std::fs;
use std::path::Path;
use std::process::Command;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_cli_compile_writes_module() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("src").join("hapt.rs");

    let exe = env!("CARGO_BIN_EXE_hatyper-gen");
    let result = Command::new(exe)
        .arg("compile")
        .arg("--states")
        .arg(fixture("entities.json"))
        .arg("--services")
        .arg(fixture("services.json"))
        .arg(&output)
        .arg("--runtime-path")
        .arg("crate::ha")
        .output()
        .expect("run cli");
    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("use crate::ha as hapth;"));
    assert!(source.contains("pub struct Entities {"));
    assert!(source.contains("pub light: LightDomain,"));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("5 entities"), "stdout: {stdout}");
}

#[test]
fn test_cli_generate_without_token_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("hapt.rs");

    let exe = env!("CARGO_BIN_EXE_hatyper-gen");
    let result = Command::new(exe)
        .env_remove("HOMEASSISTANT_TOKEN")
        .env("HOMEASSISTANT_URL", "http://127.0.0.1:9")
        .arg("generate")
        .arg(&output)
        .output()
        .expect("run cli");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("HOMEASSISTANT_TOKEN"), "stderr: {stderr}");
    assert!(!stderr.contains("Request to"), "stderr: {stderr}");
    assert!(!output.exists());
}

#[test]
fn test_cli_compile_reports_diagnostics_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let states = dir.path().join("entities.json");
    let services = dir.path().join("services.json");
    fs::write(
        &states,
        r#"[{"entity_id": "sensor.odd", "state": "1", "attributes": {"device_class": "mystery"}}]"#,
    )
    .unwrap();
    fs::write(&services, "[]").unwrap();
    let output = dir.path().join("hapt.rs");

    let exe = env!("CARGO_BIN_EXE_hatyper-gen");
    let result = Command::new(exe)
        .arg("compile")
        .arg("--states")
        .arg(&states)
        .arg("--services")
        .arg(&services)
        .arg(&output)
        .output()
        .expect("run cli");

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("unknown_device_class"), "stderr: {stderr}");
    assert!(output.exists());
}
