use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::tempdir;

fn fetchq() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fetchq"))
}

fn work_dirs(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".fetchq"))
        .collect()
}

#[test]
fn zero_parallelism_exits_before_any_work() {
    let dir = tempdir().unwrap();

    let output = fetchq()
        .args(["-p", "0", "example.com/a.txt"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("parallel"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("GET"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn negative_parallelism_is_rejected_the_same_way() {
    let dir = tempdir().unwrap();

    let status = fetchq()
        .args(["-p", "-2", "example.com/a.txt"])
        .current_dir(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn interrupt_during_allocation_tears_down() {
    let dir = tempdir().unwrap();
    let urls: Vec<String> = (0..60_000).map(|i| format!("127.0.0.1:9/{}", i)).collect();

    let mut child = fetchq()
        .args(["-q", "-p", "100000"])
        .args(&urls)
        .current_dir(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Signal only once the run is underway, i.e. the working directory exists.
    let deadline = Instant::now() + Duration::from_secs(10);
    while work_dirs(dir.path()).is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(kill.success());

    let status = child.wait().unwrap();

    // Exit 1 when interrupted, 0 if the run had already finished; never the signal.
    assert!(matches!(status.code(), Some(0) | Some(1)), "{:?}", status);
    assert!(work_dirs(dir.path()).is_empty());
}
