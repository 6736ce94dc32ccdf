//! Integration tests driving the built binaries.

use std::process::{Command, Stdio};

fn servefolder() -> Command {
    Command::new(env!("CARGO_BIN_EXE_servefolder"))
}

fn sharefolder() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sharefolder"))
}

#[test]
fn test_version_prints_report_and_exits_zero() {
    for (mut cmd, name) in [(servefolder(), "servefolder"), (sharefolder(), "sharefolder")] {
        // Port 1 would need privileges; --version must return before binding.
        let output = cmd
            .args(["--version", "--addr", "127.0.0.1:1"])
            .output()
            .expect("Failed to execute binary");

        assert!(output.status.success(), "Expected success exit code");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 5, "unexpected report: {stdout}");
        assert!(lines[0].starts_with(&format!("{name} version: v")));
        assert!(lines[1].starts_with("Platform: "));
        assert!(lines[2].starts_with("Built with: "));
        assert!(lines[3].starts_with("Author: "));
        assert!(lines[4].starts_with("Home page: "));
    }
}

#[test]
fn test_malformed_addr_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    for addr in ["8080", "::1:80", "[::1", "localhost:http"] {
        let output = servefolder()
            .args(["--addr", addr])
            .arg(dir.path())
            .output()
            .expect("Failed to execute servefolder");
        assert_eq!(output.status.code(), Some(2), "addr {addr:?}");
    }
}

#[test]
fn test_sharefolder_masks_password_and_checks_addr() {
    let dir = tempfile::tempdir().unwrap();
    let output = sharefolder()
        .args(["--password", "secret", "--addr", "bogus"])
        .arg(dir.path())
        .output()
        .expect("Failed to execute sharefolder");

    assert_eq!(output.status.code(), Some(2));
    let all = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(all.contains("Using basic auth password ******"), "{all}");
    assert!(!all.contains("secret"), "password leaked: {all}");
}

#[test]
fn test_prompted_password_is_read_from_stdin() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let mut child = sharefolder()
        .args(["--prompt-password", "--addr", "bogus"])
        .arg(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn sharefolder");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"abc\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Enter basic authentication password: "));
    let all = format!("{}{}", stdout, String::from_utf8_lossy(&output.stderr));
    assert!(all.contains("Using basic auth password ***"));
}

#[test]
fn test_single_dash_flags_are_accepted() {
    let output = servefolder()
        .arg("-version")
        .output()
        .expect("Failed to execute servefolder");
    assert!(output.status.success(), "Expected success exit code");
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("servefolder version: v"));

    let dir = tempfile::tempdir().unwrap();
    let output = servefolder()
        .args(["-addr", "bogus"])
        .arg(dir.path())
        .output()
        .expect("Failed to execute servefolder");
    assert_eq!(output.status.code(), Some(2));
}
