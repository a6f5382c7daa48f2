// Minimal integration test that drives the compiled binary through a PTY.
// This exercises the real event loop and crossterm input handling across
// the main boundaries without relying on internal modules.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Marked Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_run_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    // Resolve path to compiled binary (debug build during tests)
    let bin = assert_cmd::cargo::cargo_bin("shingi");
    let data_dir = tempfile::tempdir()?;

    // Select the untimed full-set task so the run length is deterministic
    let cmd = format!(
        "{} --task task-full --data-dir {}",
        bin.display(),
        data_dir.path().display()
    );

    // Spawn the TUI inside a pseudo terminal
    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(300));

    // Start the preselected task from the setup screen
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));

    // Judge all 20 built-in sentences with the default "true" key; wrong
    // answers are fine, the run just has to complete
    for _ in 0..20 {
        p.send("f")?;
        std::thread::sleep(Duration::from_millis(20));
    }

    // Allow the finished screen (and result write) to settle
    std::thread::sleep(Duration::from_millis(300));

    // Send ESC to exit from the finished screen
    p.send("\x1b")?; // ESC

    // Wait for the program to terminate cleanly
    p.expect(Eof)?;
    Ok(())
}

#[test]
fn list_flag_prints_builtin_sets() -> Result<(), Box<dyn std::error::Error>> {
    use assert_cmd::Command;

    let data_dir = tempfile::tempdir()?;
    let output = Command::cargo_bin("shingi")?
        .arg("--list")
        .arg("--data-dir")
        .arg(data_dir.path())
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("set-basic"));
    assert!(stdout.contains("task-demo"));
    Ok(())
}
