use std::process::Command;

#[test]
fn malformed_url_reports_validation_failure() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .args(["analyze", "https://example.com/not/github", "--format", "json"])
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["error"]["kind"], "validation");
    assert_eq!(result["commits"]["count"], 0);
    assert_eq!(result["commits"]["medianCompartmentalization"], 1.0);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".repopulse.toml"),
        "[fetch]\nconcurrency = 0\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .args(["analyze", "https://github.com/octocat/hello-world"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("concurrency"));
}
