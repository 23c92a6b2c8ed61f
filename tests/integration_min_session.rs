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
fn minimal_drill_starts_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    // Resolve path to compiled binary (debug build during tests)
    let bin = assert_cmd::cargo::cargo_bin("dryfire");
    let cmd = format!(
        "{} --par 0.2 --delay 0.1 --reps 1 --cue silent",
        bin.display()
    );

    // Spawn the TUI inside a pseudo terminal
    let mut p = spawn(cmd)?;

    // Give the app a moment to initialize the terminal/alternate screen
    std::thread::sleep(Duration::from_millis(200));

    // Start the drill and let it finish on its own
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(500));

    // Send ESC to exit from the app
    p.send("\x1b")?; // ESC

    // Wait for the program to terminate cleanly
    p.expect(Eof)?;
    Ok(())
}

#[test]
#[ignore]
fn headless_mode_prints_phase_changes() -> Result<(), Box<dyn std::error::Error>> {
    let output = assert_cmd::Command::cargo_bin("dryfire")?
        .args([
            "--headless",
            "--par",
            "0.05",
            "--delay",
            "0.05",
            "--reps",
            "2",
            "--cue",
            "silent",
        ])
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let phases: Vec<&str> = stdout
        .lines()
        .filter(|l| l.contains("\"running\""))
        .collect();
    assert_eq!(phases.len(), 4);
    assert!(stdout.lines().last().unwrap_or_default().contains("\"idle\""));
    Ok(())
}
