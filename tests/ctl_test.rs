// Runs of easycni-ctl against the real plugin binary.

use assert_cmd::cargo::{cargo_bin, CommandCargoExt};
use serde_json::{json, Value};
use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;

use easycni::input::ENV_FIELDS;

fn ctl(args: &[&str]) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("easycni-ctl")?;
    for key in ENV_FIELDS {
        cmd.env_remove(key);
    }
    Ok(cmd.args(args).stdin(Stdio::null()).output()?)
}

fn plugin_path() -> String {
    cargo_bin("easycni").display().to_string()
}

#[test]
fn test_generate_prints_conflist() -> Result<(), Box<dyn std::error::Error>> {
    let output = ctl(&["generate", "--subnet", "10.1.0.0/16"])?;

    assert!(output.status.success());
    let doc: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        doc,
        json!({
            "cniVersion": "0.3.1",
            "name": "easycni",
            "plugins": [{"type": "easycni", "subnet": "10.1.0.0/16"}]
        })
    );
    Ok(())
}

#[test]
fn test_generate_writes_output_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("10-test.conflist");
    let output = ctl(&["generate", "--name", "test-net", "--output", &path.display().to_string()])?;

    assert!(output.status.success());
    let doc: Value = serde_json::from_slice(&fs::read(&path)?)?;
    assert_eq!(doc["name"], "test-net");
    assert_eq!(doc["plugins"][0]["subnet"], "10.10.0.0/24");
    Ok(())
}

#[test]
fn test_generate_rejects_bogus_subnet() -> Result<(), Box<dyn std::error::Error>> {
    let output = ctl(&["generate", "--subnet", "bogus"])?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn test_invoke_version() -> Result<(), Box<dyn std::error::Error>> {
    let output = ctl(&["invoke", &plugin_path(), "--command", "VERSION"])?;

    assert_eq!(output.status.code(), Some(0));
    let doc: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        doc,
        json!({
            "cniVersion": "0.3.1",
            "supportedVersions": ["0.1.0", "0.2.0", "0.3.0", "0.3.1", "0.4.0", "1.0.0"]
        })
    );
    Ok(())
}

#[test]
fn test_invoke_add_with_config() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let config = tmp.path().join("net.json");
    fs::write(&config, "{\n  \"cniVersion\": \"0.3.1\",\n  \"subnet\": \"10.0.0.0/24\"\n}\n")?;

    let output = ctl(&[
        "invoke",
        &plugin_path(),
        "--command",
        "ADD",
        "--netns",
        "/var/run/netns/test",
        "--container-id",
        "abc123",
        "--config",
        &config.display().to_string(),
    ])?;

    assert_eq!(output.status.code(), Some(0));
    let doc: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        doc,
        json!({
            "cniVersion": "0.3.1",
            "interfaces": [
                {"name": "veth0", "mac": "aa:aa:aa:aa:aa:aa", "sandbox": "/var/run/netns/test"}
            ],
            "ips": [
                {"version": "4", "address": "10.0.0.10/24", "gateway": "10.0.0.1", "interface": 0}
            ],
            "routes": [],
            "dns": []
        })
    );
    Ok(())
}

#[test]
fn test_invoke_add_without_config_relays_error() -> Result<(), Box<dyn std::error::Error>> {
    let output = ctl(&["invoke", &plugin_path(), "--command", "ADD"])?;

    assert_eq!(output.status.code(), Some(0));
    let doc: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(doc["msg"], "Plugin parameters are empty. No STDIN");
    Ok(())
}

#[test]
fn test_invoke_missing_plugin_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let missing = tmp.path().join("nope").display().to_string();
    let output = ctl(&["invoke", &missing, "--command", "VERSION"])?;

    assert!(!output.status.success());
    Ok(())
}
