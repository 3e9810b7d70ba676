#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

fn tinypacks(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tinypacks"))
        .args(args)
        .output()
        .expect("tinypacks should run")
}

fn tinypacks_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tinypacks"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("tinypacks should spawn");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input)
        .expect("stdin should accept input");
    child.wait_with_output().expect("tinypacks should finish")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn temp_file(tag: &str, contents: &[u8]) -> PathBuf {
    let path = PathBuf::from(format!(
        "/tmp/tinypacks-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::write(&path, contents).expect("temp file should be writable");
    path
}

#[test]
fn encode_json_object() {
    let output = tinypacks(&["encode", "--json", r#"{"a":1}"#, "--format", "json"]);
    assert_eq!(
        stdout_json(&output),
        json!({ "length": 7, "hex": "ff000481614101" })
    );
}

#[test]
fn encode_sequence_from_stdin() {
    let output = tinypacks_stdin(
        &["encode", "--sequence", "--format", "json"],
        b"[-5, 200, \"hi\"]",
    );
    assert_eq!(stdout_json(&output)["hex"], "41fb4200c8826869");
}

#[test]
fn encode_rejects_bad_json() {
    let output = tinypacks(&["encode", "--json", "{nope", "--format", "json"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: invalid JSON input"));
}

#[test]
fn encode_reports_full_buffer() {
    let output = tinypacks(&["encode", "--json", r#""hello""#, "--capacity", "3"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn decode_hex_input() {
    let output = tinypacks(&["decode", "--hex", "41 FB 42 00 C8", "--format", "json"]);
    assert_eq!(stdout_json(&output), json!([-5, 200]));
}

#[test]
fn decode_file_input() {
    let path = temp_file("decode", &[0xFF, 0x00, 0x04, 0x81, b'a', 0x41, 0x01]);
    let output = tinypacks(&[
        "decode",
        "--file",
        path.to_str().expect("temp path should be UTF-8"),
        "--format",
        "json",
    ]);
    let _ = std::fs::remove_file(&path);
    assert_eq!(stdout_json(&output), json!([{ "a": 1 }]));
}

#[test]
fn decode_table_lists_nested_elements() {
    let output = tinypacks(&["decode", "--hex", "c2 21 01 84 74 65 78 74", "--format", "table"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("list"));
    assert!(stdout.contains("boolean"));
    assert!(stdout.contains("text"));
}

#[test]
fn decode_rejects_bad_hex() {
    let output = tinypacks(&["decode", "--hex", "4", "--format", "json"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn frame_payload() {
    let output = tinypacks(&["frame", "--hex", "010203", "--format", "json"]);
    assert_eq!(stdout_json(&output)["hex"], "01020361317e");

    let output = tinypacks(&["frame", "--hex", "7e417d", "--format", "json"]);
    assert_eq!(stdout_json(&output)["hex"], "7d5e417d5d52ce7e");
}

#[test]
fn deframe_skips_noise() {
    let output = tinypacks(&[
        "deframe",
        "--hex",
        "13377e01020361317e",
        "--format",
        "json",
    ]);
    assert_eq!(
        stdout_json(&output),
        json!([{ "index": 0, "length": 3, "hex": "010203" }])
    );
}

#[test]
fn deframe_without_frames_fails() {
    let output = tinypacks(&["deframe", "--hex", "01020300007e", "--format", "json"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(output.stdout.is_empty());
}

#[test]
fn request_index_is_framed_with_leading_flag() {
    let output = tinypacks(&["request", "get", "", "--token", "7", "--format", "json"]);
    assert_eq!(stdout_json(&output)["hex"], "7e4101410780ef0f7e");
}

#[test]
fn request_with_body_unframed() {
    let output = tinypacks(&[
        "request",
        "put",
        "led",
        "--token",
        "2",
        "--body",
        "[true]",
        "--unframed",
        "--format",
        "json",
    ]);
    assert_eq!(stdout_json(&output)["hex"], "41034102836c65642101");
}

#[test]
fn request_rejects_long_path() {
    let output = tinypacks(&["request", "get", "0123456789abcdef", "--format", "json"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn response_unframed_and_framed() {
    let expected = json!({
        "code": 0x25,
        "status": "205 Content",
        "token": 7,
        "body": [true]
    });

    let output = tinypacks(&["response", "--unframed", "--hex", "412541072101", "--format", "json"]);
    assert_eq!(stdout_json(&output), expected);

    let output = tinypacks(&["response", "--hex", "412541072101bc1d7e", "--format", "json"]);
    assert_eq!(stdout_json(&output), expected);
}

#[test]
fn response_error_status_exits_nonzero() {
    let output = tinypacks(&["response", "--unframed", "--hex", "4144", "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let value: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["status"], "404 Not Found");
    assert_eq!(value["token"], Value::Null);
}

#[test]
fn response_unknown_status_is_invalid_data() {
    let output = tinypacks(&["response", "--unframed", "--hex", "4123", "--format", "json"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn version_prints_package_version() {
    let output = tinypacks(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("tinypacks {}", env!("CARGO_PKG_VERSION"))
    );
}
