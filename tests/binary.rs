//! The line protocol served by the `fibtrack` binary.

use std::io::Write;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use serde_json::Value;
use serde_json::json;

fn fibtrack() -> Command {
    return Command::new(env!("CARGO_BIN_EXE_fibtrack"));
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn serves_commands_and_journals_on_quit() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("fibapi_backup");
    let mut child = fibtrack()
        .arg("--file")
        .arg(&journal)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"next\nnext\nnext\ncurrent\nbogus\nstats\nprevious\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let replies: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 7);
    assert_eq!(replies[0], json!({ "index": 1, "value": "1" }));
    assert_eq!(replies[1], json!({ "index": 2, "value": "1" }));
    assert_eq!(replies[2], json!({ "index": 3, "value": "2" }));
    assert_eq!(replies[3], json!({ "index": 3, "value": "2" }));
    assert_eq!(replies[4], json!({ "error": "unknown command" }));
    assert_eq!(replies[6], json!({ "index": 2, "value": "1" }));

    let stats = replies[5].as_object().unwrap();
    let mut keys: Vec<&str> = stats.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, ["close", "direct", "miss"]);
    let counted: u64 = stats.values().map(|count| count.as_u64().unwrap()).sum();
    assert_eq!(counted, 4);

    assert_eq!(std::fs::read(&journal).unwrap(), vec![2, 0, 0, 0]);
}

#[test]
fn resumes_from_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("fibapi_backup");
    std::fs::write(&journal, 50u32.to_le_bytes()).unwrap();
    let mut child = fibtrack()
        .arg("--file")
        .arg(&journal)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"current\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let reply: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reply, json!({ "index": 50, "value": "12586269025" }));
}

// =============================================================================
// Journal failure
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn exits_when_journal_gives_up_while_idle() {
    // Writes to /dev/full always fail; stdin stays open and silent.
    let started = Instant::now();
    let mut child = fibtrack()
        .args(["--file", "/dev/full", "--seconds", "1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take().unwrap();

    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if started.elapsed() > Duration::from_secs(20) {
            child.kill().unwrap();
            panic!("still running with a dead journal");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    drop(stdin);

    assert!(!status.success());
    assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
}
