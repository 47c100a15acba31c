use assert_cmd::cargo::cargo_bin_cmd;
use qoe_lib::signal::TimeSeries;
use std::error::Error;
use std::path::PathBuf;

fn sample_path(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative);
    root.to_string_lossy().to_string()
}

#[test]
fn changes_command_reads_file() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("qoe");
    cmd.args(["changes", "--input", &sample_path("test_data/resolution_data.csv")]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let changes: TimeSeries = serde_json::from_slice(&out)?;
    assert_eq!(changes.len(), 60);
    assert_eq!(changes.data[0], 0.0);
    assert_eq!(changes.data[6], 8.0);
    assert!(changes.data.iter().all(|v| *v >= 0.0));
    Ok(())
}

#[test]
fn changes_command_reads_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("qoe");
    cmd.arg("changes").write_stdin("8\n8\n16\n16\n");
    let out = cmd.assert().success().get_output().stdout.clone();
    let changes: TimeSeries = serde_json::from_slice(&out)?;
    assert_eq!(changes.data, vec![0.0, 0.0, 8.0, 0.0]);
    Ok(())
}

#[test]
fn changes_command_rejects_malformed_records() {
    let mut cmd = cargo_bin_cmd!("qoe");
    cmd.args(["changes", "--input", &sample_path("test_data/resolution_malformed.csv")]);
    let out = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&out);
    assert!(stderr.contains("line 3"), "{}", stderr);
}
